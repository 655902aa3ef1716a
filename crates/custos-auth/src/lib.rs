//! Identity primitives for Custos.
//!
//! Provides:
//! - [`UserId`] - Identifier of an authenticated caller
//! - [`IdentityContext`] - Per-request caller identity and admin flag
//! - [`IdentityProvider`] - Trait for async token → identity resolution (implement per provider)
//! - [`StaticTokenProvider`] - Table-driven provider for development and tests
//! - [`AuthLayer`] / [`AuthService`] - Tower middleware parameterised over `IdentityProvider`
//! - [`AuthConfig`] - Configuration for the auth layer
//! - [`AuthError`] - Auth-specific error types
//!
//! Credential verification is the provider's business. The middleware only
//! attaches whatever identity the provider returns, falling back to
//! [`IdentityContext::anonymous`] so downstream access rules can decide.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod error;
mod identity;
mod middleware;
mod static_tokens;

pub use error::AuthError;
pub use identity::{identity_from_parts, IdentityContext, UserId};
pub use middleware::{AuthLayer, AuthService};
pub use static_tokens::{StaticTokenProvider, TokenGrant};

use std::future::Future;
use std::pin::Pin;

/// Configuration for the auth middleware.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Respond 401 when a bearer token is present but cannot be resolved.
    ///
    /// When false (the default) the request continues as anonymous and the
    /// access rules of the target operation decide.
    pub reject_invalid_tokens: bool,
}

/// Future returned by [`IdentityProvider::identify`].
pub type IdentityFuture<'a> =
    Pin<Box<dyn Future<Output = Result<IdentityContext, AuthError>> + Send + 'a>>;

/// Trait for resolving a bearer token into a caller identity.
///
/// Implement this for each identity provider (JWT, session store, etc.).
/// The middleware calls `identify()` with the bearer token and attaches the
/// returned identity to the request.
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolve a token into the caller's identity.
    fn identify(&self, token: &str) -> IdentityFuture<'_>;
}
