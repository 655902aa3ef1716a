//! Entity shapes as seen by the access-control layer.
//!
//! Entities are opaque beyond the handful of fields that lead to an owner.
//! Each entity type declares an [`EntityShape`] once; ownership descriptors
//! are checked against these shapes when the catalog is built, and the same
//! field names are then looked up on live instances through
//! [`Entity::field`].

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Identifier of a persisted entity (64-bit integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Wraps a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for EntityId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Name of an entity type, e.g. `"Order"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityType(&'static str);

impl EntityType {
    /// Creates an entity type name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the type name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// What a declared field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A nullable 64-bit identifier.
    Id,
    /// A nullable relation to another entity type.
    Ref(EntityType),
    /// Anything else; cannot appear on an ownership path.
    Scalar,
}

/// Static description of an entity type's ownership-relevant fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityShape {
    entity_type: EntityType,
    identity_bearing: bool,
    fields: BTreeMap<&'static str, FieldKind>,
    accessors: BTreeSet<&'static str>,
}

impl EntityShape {
    /// Start a shape. Every shape declares `id` as an [`FieldKind::Id`].
    pub fn new(entity_type: EntityType) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("id", FieldKind::Id);
        Self {
            entity_type,
            identity_bearing: false,
            fields,
            accessors: BTreeSet::new(),
        }
    }

    /// Mark this type as the identity-bearing type (its id is a user id).
    pub fn identity_bearing(mut self) -> Self {
        self.identity_bearing = true;
        self
    }

    /// Declare a field.
    pub fn field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.insert(name, kind);
        self
    }

    /// Declare a zero-argument accessor returning an owner id.
    pub fn accessor(mut self, name: &'static str) -> Self {
        self.accessors.insert(name);
        self
    }

    /// The described type.
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    /// Whether instances of this type are themselves users.
    pub fn is_identity_bearing(&self) -> bool {
        self.identity_bearing
    }

    /// Kind of a declared field, `None` if undeclared.
    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields.get(name).copied()
    }

    /// Whether the named accessor is declared.
    pub fn has_accessor(&self, name: &str) -> bool {
        self.accessors.contains(name)
    }
}

// ============================================================================
// Entity trait
// ============================================================================

/// Value of a field on a live entity.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    /// An identifier.
    Id(i64),
    /// A loaded related entity.
    Ref(&'a dyn Entity),
    /// The field is present but empty.
    Null,
    /// A value that is neither an id nor a relation.
    Scalar,
}

/// A record the access layer can inspect for ownership.
///
/// Implementations answer field lookups by name for the fields their
/// [`shape`](Entity::shape) declares, including `id`.
pub trait Entity: Any + Send + Sync + fmt::Debug {
    /// Static shape of this type.
    fn shape() -> EntityShape
    where
        Self: Sized;

    /// The runtime type name.
    fn entity_type(&self) -> EntityType;

    /// This entity's identifier.
    fn id(&self) -> EntityId;

    /// Look up a field. `None` means the field does not exist on this type.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Invoke a named zero-argument owner accessor.
    ///
    /// `None` means no such accessor. `Some(Err(_))` is a failing accessor and
    /// `Some(Ok(None))` an accessor that yielded nothing.
    fn call_accessor(&self, name: &str) -> Option<Result<Option<i64>, String>> {
        let _ = name;
        None
    }
}

/// An entity loaded during access evaluation, handed on to business logic.
///
/// Inserted into request extensions on ALLOW so handlers do not load the same
/// record twice.
#[derive(Debug, Clone)]
pub struct LoadedEntity(Arc<dyn Entity>);

impl LoadedEntity {
    /// Wrap a loaded entity.
    pub fn new(entity: Arc<dyn Entity>) -> Self {
        Self(entity)
    }

    /// Borrow the entity as a trait object.
    pub fn entity(&self) -> &dyn Entity {
        &*self.0
    }

    /// Shared handle to the entity.
    pub fn as_arc(&self) -> Arc<dyn Entity> {
        self.0.clone()
    }

    /// The entity's identifier.
    pub fn id(&self) -> EntityId {
        self.0.id()
    }

    /// The entity's type.
    pub fn entity_type(&self) -> EntityType {
        self.0.entity_type()
    }

    /// Downcast to a concrete entity type.
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        let any: &dyn Any = &*self.0;
        any.downcast_ref::<T>()
    }
}
