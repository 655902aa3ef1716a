//! # custos-acl
//!
//! Declarative access control for API operations.
//!
//! Each operation declares an [`AccessRule`] where it is defined; each entity
//! type declares how its owner is found, once, in the [`EntityCatalog`]. At
//! request time the [`EnforcementPoint`] evaluates the rule before any
//! business logic runs:
//! - [`AccessLevel`] and [`AccessRule`] - the declaration model
//! - [`OwnershipDescriptor`] and [`resolve_owner_id`] - ownership path resolution
//! - [`EntityLoader`] - the persistence boundary, with [`InMemoryStore`]
//! - [`AccessDecisionEngine`] - ALLOW or DENY for a rule and an identity
//! - [`RuleRegistry`] - startup validation of every declared rule
//! - [`EnforcementPoint`] - the per-invocation gate producing an [`Outcome`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod enforcement;
pub mod engine;
pub mod entity;
pub mod error;
pub mod loader;
pub mod ownership;
pub mod policy;
pub mod registry;
pub mod store;

mod proptests;

pub use catalog::{EntityCatalog, EntityCatalogBuilder};
pub use enforcement::{Denial, EnforcementPoint, Outcome};
pub use engine::{AccessDecisionEngine, Decision};
pub use entity::{Entity, EntityId, EntityShape, EntityType, FieldKind, FieldValue, LoadedEntity};
pub use error::{DenialKind, Error, Result};
pub use loader::{EntityLoader, LoadError};
pub use ownership::{resolve_owner_id, CompiledOwnership, OwnershipDescriptor};
pub use policy::{AccessLevel, AccessRule, DEFAULT_ENTITY_ID_PARAM};
pub use registry::{route_params, Operation, OperationId, RuleRegistry, RuleRegistryBuilder};
pub use store::InMemoryStore;
