//! # custos-api
//!
//! HTTP surface of Custos.
//!
//! - [`AccessLayer`] - per-route enforcement of declared access rules
//! - [`denial_response`] - denial to HTTP mapping (401, 403, 404, 500)
//! - [`CustosConfig`] - TOML configuration with environment overrides
//! - [`domain`] - the demo shop entities and their ownership
//! - [`routes`] - route table, access declarations, and handlers
//! - [`Server`] - startup validation and serving

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

pub use config::CustosConfig;
pub use error::{Error, Result};
pub use middleware::{denial_response, denial_status, AccessLayer, AccessService};
pub use server::Server;
