//! Error types for custos-acl

use std::fmt;

use thiserror::Error;

use crate::entity::{EntityId, EntityType};

/// Result type alias for custos-acl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while declaring or evaluating access rules.
///
/// The first three variants are legitimate denials. `OwnershipUnresolvable`
/// is a denial too, reported as [`DenialKind::Forbidden`]. The remaining
/// variants are deployment or infrastructure faults and are never shown to a
/// caller as an authorization outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// No caller identity is present.
    #[error("authentication required")]
    Unauthenticated,

    /// The caller is known but not allowed.
    #[error("forbidden: {reason}")]
    Forbidden {
        /// Why access was refused
        reason: String,
    },

    /// The protected entity does not exist.
    #[error("{entity_type} {id} not found")]
    EntityNotFound {
        /// Type that was looked up
        entity_type: EntityType,
        /// Identifier that was looked up
        id: EntityId,
    },

    /// The owner could not be determined (null along the path, failing accessor).
    #[error("cannot resolve owner of {entity_type} via '{descriptor}': {reason}")]
    OwnershipUnresolvable {
        /// Entity type being resolved
        entity_type: EntityType,
        /// The ownership descriptor, rendered
        descriptor: String,
        /// What went wrong
        reason: String,
    },

    /// The ownership descriptor does not match the entity's declared shape.
    #[error("invalid ownership path '{descriptor}' on {entity_type}: {reason}")]
    InvalidOwnershipPath {
        /// Entity type the descriptor was declared for
        entity_type: EntityType,
        /// The ownership descriptor, rendered
        descriptor: String,
        /// What went wrong
        reason: String,
    },

    /// Access rules are wired incorrectly.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What configuration is problematic
        message: String,
    },

    /// The entity loader failed for a reason other than absence.
    #[error("entity loader failed: {message}")]
    Loader {
        /// Loader-provided detail
        message: String,
    },
}

impl Error {
    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new forbidden error.
    pub fn forbidden<S: Into<String>>(reason: S) -> Self {
        Error::Forbidden {
            reason: reason.into(),
        }
    }

    /// The externally visible class of this error.
    pub fn kind(&self) -> DenialKind {
        match self {
            Error::Unauthenticated => DenialKind::Unauthenticated,
            Error::Forbidden { .. } | Error::OwnershipUnresolvable { .. } => DenialKind::Forbidden,
            Error::EntityNotFound { .. } => DenialKind::NotFound,
            Error::InvalidOwnershipPath { .. }
            | Error::Configuration { .. }
            | Error::Loader { .. } => DenialKind::Internal,
        }
    }

    /// Whether this error reflects a wiring defect rather than a decision.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidOwnershipPath { .. } | Error::Configuration { .. }
        )
    }
}

/// Externally visible outcome class of a refused operation.
///
/// The three caller-facing kinds are never collapsed into one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialKind {
    /// The caller must authenticate first.
    Unauthenticated,
    /// The caller is authenticated but not allowed.
    Forbidden,
    /// The target entity does not exist.
    NotFound,
    /// Access could not be evaluated (misconfiguration, loader outage).
    Internal,
}

impl DenialKind {
    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Unauthenticated.to_string(), "authentication required");
        assert_eq!(
            Error::forbidden("not the owner").to_string(),
            "forbidden: not the owner"
        );
        let err = Error::EntityNotFound {
            entity_type: EntityType::new("Order"),
            id: EntityId::new(100),
        };
        assert_eq!(err.to_string(), "Order 100 not found");
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::Unauthenticated.kind(), DenialKind::Unauthenticated);
        assert_eq!(Error::forbidden("x").kind(), DenialKind::Forbidden);
        assert_eq!(
            Error::OwnershipUnresolvable {
                entity_type: EntityType::new("Order"),
                descriptor: "user.id".into(),
                reason: "user is null".into(),
            }
            .kind(),
            DenialKind::Forbidden,
            "unresolvable ownership fails closed"
        );
        assert_eq!(
            Error::EntityNotFound {
                entity_type: EntityType::new("Order"),
                id: EntityId::new(1),
            }
            .kind(),
            DenialKind::NotFound
        );
        assert_eq!(Error::config("x").kind(), DenialKind::Internal);
        assert_eq!(
            Error::Loader {
                message: "timeout".into()
            }
            .kind(),
            DenialKind::Internal
        );
    }

    #[test]
    fn test_is_configuration() {
        assert!(Error::config("bad").is_configuration());
        assert!(
            Error::InvalidOwnershipPath {
                entity_type: EntityType::new("Order"),
                descriptor: "owner.id".into(),
                reason: "no field 'owner'".into(),
            }
            .is_configuration()
        );
        assert!(!Error::Unauthenticated.is_configuration());
        assert!(
            !Error::Loader {
                message: "down".into()
            }
            .is_configuration()
        );
    }

    #[test]
    fn test_denial_kind_names() {
        assert_eq!(DenialKind::Unauthenticated.as_str(), "unauthenticated");
        assert_eq!(DenialKind::Forbidden.to_string(), "forbidden");
        assert_eq!(DenialKind::NotFound.as_str(), "not_found");
        assert_eq!(DenialKind::Internal.as_str(), "internal");
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
