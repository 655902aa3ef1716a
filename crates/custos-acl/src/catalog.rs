//! Entity catalog: the per-type ownership configuration.
//!
//! Every protected entity type is registered once, with its shape and its
//! [`OwnershipDescriptor`]. [`EntityCatalogBuilder::build`] compiles all
//! descriptors in one pass and refuses to produce a catalog if any of them
//! is malformed. The built catalog is immutable.

use std::collections::HashMap;

use crate::entity::{Entity, EntityShape, EntityType};
use crate::error::{Error, Result};
use crate::ownership::{CompiledOwnership, OwnershipDescriptor};

/// Builder collecting entity registrations.
#[derive(Debug, Default)]
pub struct EntityCatalogBuilder {
    entries: Vec<(EntityShape, OwnershipDescriptor)>,
}

impl EntityCatalogBuilder {
    /// Register an entity type using its declared shape.
    pub fn register<T: Entity>(self, descriptor: OwnershipDescriptor) -> Self {
        self.register_shape(T::shape(), descriptor)
    }

    /// Register an entity type from an explicit shape.
    pub fn register_shape(mut self, shape: EntityShape, descriptor: OwnershipDescriptor) -> Self {
        self.entries.push((shape, descriptor));
        self
    }

    /// Validate every descriptor against the registered shapes.
    pub fn build(self) -> Result<EntityCatalog> {
        let mut shapes = HashMap::with_capacity(self.entries.len());
        for (shape, _) in &self.entries {
            if shapes.insert(shape.entity_type(), shape.clone()).is_some() {
                return Err(Error::config(format!(
                    "entity type {} registered more than once",
                    shape.entity_type()
                )));
            }
        }

        let mut ownership = HashMap::with_capacity(self.entries.len());
        for (shape, descriptor) in &self.entries {
            let compiled = CompiledOwnership::compile(shape, descriptor, &shapes)?;
            log::debug!(
                "Ownership of {} resolves via '{descriptor}'",
                shape.entity_type()
            );
            ownership.insert(shape.entity_type(), compiled);
        }

        Ok(EntityCatalog { shapes, ownership })
    }
}

/// Immutable, validated ownership configuration for all entity types.
#[derive(Debug, Default)]
pub struct EntityCatalog {
    shapes: HashMap<EntityType, EntityShape>,
    ownership: HashMap<EntityType, CompiledOwnership>,
}

impl EntityCatalog {
    /// Start building a catalog.
    pub fn builder() -> EntityCatalogBuilder {
        EntityCatalogBuilder::default()
    }

    /// Whether the type is registered.
    pub fn contains(&self, entity_type: EntityType) -> bool {
        self.shapes.contains_key(&entity_type)
    }

    /// The declared shape of a type.
    pub fn shape(&self, entity_type: EntityType) -> Option<&EntityShape> {
        self.shapes.get(&entity_type)
    }

    /// The compiled ownership plan of a type.
    pub fn ownership(&self, entity_type: EntityType) -> Option<&CompiledOwnership> {
        self.ownership.get(&entity_type)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
