//! Access levels and access rules.
//!
//! An [`AccessRule`] is the declaration attached to one operation. It is
//! immutable once built; the registry validates it against the operation's
//! parameters and the entity catalog at startup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;

/// Parameter carrying the entity id when a rule does not name one.
pub const DEFAULT_ENTITY_ID_PARAM: &str = "id";

/// Authorization policy class of an operation.
///
/// No strictness order is implied; each level has its own evaluation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    /// Anyone, authenticated or not.
    Public,
    /// Any authenticated caller.
    Authenticated,
    /// The entity's owner, or any admin.
    OwnerOrAdmin,
    /// Admins only.
    AdminOnly,
}

impl AccessLevel {
    /// Whether evaluating this level needs a target entity.
    pub fn requires_entity(&self) -> bool {
        matches!(self, Self::OwnerOrAdmin)
    }

    /// Message used when a rule does not carry its own.
    pub fn default_denied_message(&self) -> &'static str {
        match self {
            Self::Public | Self::Authenticated => "Authentication required",
            Self::OwnerOrAdmin => "Access denied: not the owner of this entity",
            Self::AdminOnly => "Admin access required",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "PUBLIC"),
            Self::Authenticated => write!(f, "AUTHENTICATED"),
            Self::OwnerOrAdmin => write!(f, "OWNER_OR_ADMIN"),
            Self::AdminOnly => write!(f, "ADMIN_ONLY"),
        }
    }
}

/// The access declaration attached to an operation.
///
/// # Example
///
/// ```
/// use custos_acl::{AccessLevel, AccessRule, EntityType};
///
/// const ORDER: EntityType = EntityType::new("Order");
///
/// let rule = AccessRule::owner_or_admin(ORDER)
///     .entity_id_param("orderId")
///     .denied_message("You can only cancel your own orders");
///
/// assert_eq!(rule.level(), AccessLevel::OwnerOrAdmin);
/// assert_eq!(rule.entity_id_param_name(), "orderId");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    level: AccessLevel,
    entity_id_param: String,
    entity_type: Option<EntityType>,
    denied_message: Option<String>,
    skip: bool,
}

impl AccessRule {
    /// A rule at `level` with default settings.
    pub fn new(level: AccessLevel) -> Self {
        Self {
            level,
            entity_id_param: DEFAULT_ENTITY_ID_PARAM.to_string(),
            entity_type: None,
            denied_message: None,
            skip: false,
        }
    }

    /// Anyone may call.
    pub fn public() -> Self {
        Self::new(AccessLevel::Public)
    }

    /// Any authenticated caller may call.
    pub fn authenticated() -> Self {
        Self::new(AccessLevel::Authenticated)
    }

    /// Only admins may call.
    pub fn admin_only() -> Self {
        Self::new(AccessLevel::AdminOnly)
    }

    /// Owner of the `entity_type` instance named by the id parameter, or an admin.
    pub fn owner_or_admin(entity_type: EntityType) -> Self {
        Self::new(AccessLevel::OwnerOrAdmin).entity_type(entity_type)
    }

    /// The operation does its own checking; evaluation always allows.
    pub fn skip() -> Self {
        Self {
            skip: true,
            ..Self::new(AccessLevel::Authenticated)
        }
    }

    /// Name of the parameter carrying the entity id.
    pub fn entity_id_param(mut self, name: impl Into<String>) -> Self {
        self.entity_id_param = name.into();
        self
    }

    /// Protected entity type.
    pub fn entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    /// Custom message for denials.
    pub fn denied_message(mut self, message: impl Into<String>) -> Self {
        self.denied_message = Some(message.into());
        self
    }

    /// The access level.
    pub fn level(&self) -> AccessLevel {
        self.level
    }

    /// The entity id parameter name.
    pub fn entity_id_param_name(&self) -> &str {
        &self.entity_id_param
    }

    /// The protected entity type, if any.
    pub fn protected_type(&self) -> Option<EntityType> {
        self.entity_type
    }

    /// The custom denial message, if any.
    pub fn custom_message(&self) -> Option<&str> {
        self.denied_message.as_deref()
    }

    /// Whether evaluation is bypassed.
    pub fn is_skipped(&self) -> bool {
        self.skip
    }
}
