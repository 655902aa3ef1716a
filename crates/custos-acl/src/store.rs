//! In-memory entity store.
//!
//! A [`EntityLoader`] backed by a map, used by the development server and by
//! tests. Cheap to clone; clones share the same records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entity::{Entity, EntityId, EntityType};
use crate::loader::{EntityLoader, LoadError};

type Records = HashMap<(EntityType, EntityId), Arc<dyn Entity>>;

/// Map-backed entity store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Records>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity, returning the previous record.
    pub async fn insert<T: Entity>(&self, entity: T) -> Option<Arc<dyn Entity>> {
        self.insert_arc(Arc::new(entity)).await
    }

    /// Insert or replace an already shared entity.
    pub async fn insert_arc(&self, entity: Arc<dyn Entity>) -> Option<Arc<dyn Entity>> {
        let key = (entity.entity_type(), entity.id());
        self.records.write().await.insert(key, entity)
    }

    /// Remove an entity.
    pub async fn remove(&self, entity_type: EntityType, id: EntityId) -> Option<Arc<dyn Entity>> {
        self.records.write().await.remove(&(entity_type, id))
    }

    /// Fetch without going through the loader error type.
    pub async fn get(&self, entity_type: EntityType, id: EntityId) -> Option<Arc<dyn Entity>> {
        self.records.read().await.get(&(entity_type, id)).cloned()
    }

    /// All entities of one type, ordered by id.
    pub async fn all(&self, entity_type: EntityType) -> Vec<Arc<dyn Entity>> {
        let mut found: Vec<_> = self
            .records
            .read()
            .await
            .iter()
            .filter(|((ty, _), _)| *ty == entity_type)
            .map(|(_, entity)| entity.clone())
            .collect();
        found.sort_by_key(|e| e.id());
        found
    }

    /// Total number of records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl EntityLoader for InMemoryStore {
    async fn load(
        &self,
        entity_type: EntityType,
        id: EntityId,
    ) -> Result<Arc<dyn Entity>, LoadError> {
        self.get(entity_type, id)
            .await
            .ok_or(LoadError::NotFound { entity_type, id })
    }
}
