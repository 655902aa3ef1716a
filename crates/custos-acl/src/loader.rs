//! Entity loader contract.
//!
//! Persistence is not this crate's concern. The decision engine only needs
//! to fetch one entity of a known type by id; anything that can do that
//! implements [`EntityLoader`]. Timeouts and cancellation belong to the
//! implementation and must surface as [`LoadError::Unavailable`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::entity::{Entity, EntityId, EntityType};
use crate::error::Error;

/// Failure to produce an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// No entity with that id exists.
    #[error("{entity_type} {id} not found")]
    NotFound {
        /// Requested type
        entity_type: EntityType,
        /// Requested id
        id: EntityId,
    },

    /// The backing store failed or timed out.
    #[error("entity store unavailable: {0}")]
    Unavailable(String),
}

impl From<LoadError> for Error {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound { entity_type, id } => Error::EntityNotFound { entity_type, id },
            LoadError::Unavailable(message) => Error::Loader { message },
        }
    }
}

/// Loads entities by type and id.
#[async_trait]
pub trait EntityLoader: Send + Sync {
    /// Load one entity.
    async fn load(
        &self,
        entity_type: EntityType,
        id: EntityId,
    ) -> Result<Arc<dyn Entity>, LoadError>;
}
