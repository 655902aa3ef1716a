//! Ownership descriptors and the owner-id resolver.
//!
//! A descriptor says how to reach the owning user's id from an entity:
//! either a dotted field path (`user.id`, `owner.id`, `user_id`) or a named
//! accessor. The empty path means the entity *is* the user.
//!
//! Descriptors are compiled once against the declared [`EntityShape`]s
//! (see [`crate::catalog::EntityCatalog`]) so a typo surfaces at startup.
//! [`resolve_owner_id`] then walks the precompiled steps on each request.

use std::collections::HashMap;
use std::fmt;

use custos_auth::UserId;

use crate::entity::{Entity, EntityShape, EntityType, FieldKind, FieldValue};
use crate::error::{Error, Result};

/// How to locate an entity's owner. Declared per entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipDescriptor {
    /// Successive field lookups; empty means "the entity's own id".
    Path(Vec<String>),
    /// A zero-argument accessor on the entity.
    Accessor(String),
}

impl OwnershipDescriptor {
    /// Parse a dotted path such as `"user.id"`. `""` is the self path.
    pub fn path(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::Path(Vec::new());
        }
        Self::Path(dotted.split('.').map(str::to_string).collect())
    }

    /// The entity's own identifier is the owner id.
    pub fn owner_is_self() -> Self {
        Self::Path(Vec::new())
    }

    /// Use a named accessor.
    pub fn accessor(name: impl Into<String>) -> Self {
        Self::Accessor(name.into())
    }
}

impl fmt::Display for OwnershipDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(steps) if steps.is_empty() => f.write_str("<self>"),
            Self::Path(steps) => f.write_str(&steps.join(".")),
            Self::Accessor(name) => write!(f, "{name}()"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Plan {
    SelfId,
    Fields(Vec<String>),
    Accessor(String),
}

/// A descriptor validated against its entity type's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOwnership {
    entity_type: EntityType,
    descriptor: OwnershipDescriptor,
    plan: Plan,
}

impl CompiledOwnership {
    /// Validate `descriptor` against `shape`, following relations through `shapes`.
    pub fn compile(
        shape: &EntityShape,
        descriptor: &OwnershipDescriptor,
        shapes: &HashMap<EntityType, EntityShape>,
    ) -> Result<Self> {
        let entity_type = shape.entity_type();
        let invalid = |reason: String| Error::InvalidOwnershipPath {
            entity_type,
            descriptor: descriptor.to_string(),
            reason,
        };

        let plan = match descriptor {
            OwnershipDescriptor::Path(steps) if steps.is_empty() => {
                if !shape.is_identity_bearing() {
                    return Err(invalid(
                        "the self path is only valid on the identity-bearing type".to_string(),
                    ));
                }
                Plan::SelfId
            }
            OwnershipDescriptor::Path(steps) => {
                let mut current = shape;
                for (i, step) in steps.iter().enumerate() {
                    if step.is_empty() {
                        return Err(invalid("empty path segment".to_string()));
                    }
                    let kind = current.field_kind(step).ok_or_else(|| {
                        invalid(format!(
                            "no field '{step}' on {}",
                            current.entity_type()
                        ))
                    })?;
                    let last = i + 1 == steps.len();
                    match (kind, last) {
                        (FieldKind::Id, true) => {}
                        (FieldKind::Ref(next), false) => {
                            current = shapes.get(&next).ok_or_else(|| {
                                invalid(format!("'{step}' refers to unregistered type {next}"))
                            })?;
                        }
                        (_, true) => {
                            return Err(invalid(format!("'{step}' is not an identifier")));
                        }
                        (_, false) => {
                            return Err(invalid(format!("'{step}' is not a relation")));
                        }
                    }
                }
                Plan::Fields(steps.clone())
            }
            OwnershipDescriptor::Accessor(name) => {
                if !shape.has_accessor(name) {
                    return Err(invalid(format!("no accessor '{name}' on {entity_type}")));
                }
                Plan::Accessor(name.clone())
            }
        };

        Ok(Self {
            entity_type,
            descriptor: descriptor.clone(),
            plan,
        })
    }

    /// The entity type this plan applies to.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// The source descriptor.
    pub fn descriptor(&self) -> &OwnershipDescriptor {
        &self.descriptor
    }
}

/// Resolve the owning user's id of `entity`.
///
/// Read-only; never mutates the entity. A null anywhere on the path or a
/// failing accessor yields [`Error::OwnershipUnresolvable`]. A field or
/// accessor that does not exist yields [`Error::InvalidOwnershipPath`].
pub fn resolve_owner_id(entity: &dyn Entity, ownership: &CompiledOwnership) -> Result<UserId> {
    let entity_type = entity.entity_type();
    let descriptor = ownership.descriptor.to_string();
    let invalid = |reason: String| Error::InvalidOwnershipPath {
        entity_type,
        descriptor: descriptor.clone(),
        reason,
    };
    let unresolvable = |reason: String| Error::OwnershipUnresolvable {
        entity_type,
        descriptor: descriptor.clone(),
        reason,
    };

    if entity_type != ownership.entity_type {
        return Err(invalid(format!(
            "descriptor compiled for {} applied to {entity_type}",
            ownership.entity_type
        )));
    }

    match &ownership.plan {
        Plan::SelfId => Ok(UserId::new(entity.id().get())),
        Plan::Fields(steps) => {
            let mut current = entity;
            for (i, step) in steps.iter().enumerate() {
                let last = i + 1 == steps.len();
                match current.field(step) {
                    None => return Err(invalid(format!("no field '{step}'"))),
                    Some(FieldValue::Null) => {
                        log::debug!("Owner path '{descriptor}' is null at '{step}'");
                        return Err(unresolvable(format!("'{step}' is null")));
                    }
                    Some(FieldValue::Id(id)) if last => return Ok(UserId::new(id)),
                    Some(FieldValue::Ref(next)) if !last => current = next,
                    Some(_) => {
                        return Err(invalid(format!(
                            "'{step}' does not match its declared kind"
                        )));
                    }
                }
            }
            // Compilation rejects empty field plans.
            Err(invalid("empty field plan".to_string()))
        }
        Plan::Accessor(name) => match entity.call_accessor(name) {
            None => Err(invalid(format!("no accessor '{name}'"))),
            Some(Err(reason)) => Err(unresolvable(reason)),
            Some(Ok(None)) => Err(unresolvable(format!("'{name}' returned no owner"))),
            Some(Ok(Some(id))) => Ok(UserId::new(id)),
        },
    }
}
