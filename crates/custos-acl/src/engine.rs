//! Access decision engine.
//!
//! Evaluates one [`AccessRule`] against the caller's [`IdentityContext`] and,
//! for owner-scoped rules, the target entity. The engine drives the loader
//! itself so that the admin bypass happens strictly before any load.

use std::sync::Arc;

use custos_auth::IdentityContext;

use crate::catalog::EntityCatalog;
use crate::entity::{EntityId, LoadedEntity};
use crate::error::Error;
use crate::loader::EntityLoader;
use crate::ownership::resolve_owner_id;
use crate::policy::{AccessLevel, AccessRule};

/// Result of one evaluation.
#[derive(Debug, Clone)]
pub enum Decision {
    /// Proceed. Carries the entity if one was loaded during evaluation.
    Allow(Option<LoadedEntity>),
    /// Refuse, with the precise reason.
    Deny(Error),
}

impl Decision {
    /// Whether this is an ALLOW.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }

    /// The denial reason, if denied.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Decision::Allow(_) => None,
            Decision::Deny(err) => Some(err),
        }
    }
}

/// Stateless evaluator over the entity catalog and a loader.
#[derive(Clone)]
pub struct AccessDecisionEngine {
    catalog: Arc<EntityCatalog>,
    loader: Arc<dyn EntityLoader>,
}

impl std::fmt::Debug for AccessDecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessDecisionEngine")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl AccessDecisionEngine {
    /// Create an engine.
    pub fn new(catalog: Arc<EntityCatalog>, loader: Arc<dyn EntityLoader>) -> Self {
        Self { catalog, loader }
    }

    /// The catalog used for ownership resolution.
    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    /// Decide whether `identity` may perform an operation guarded by `rule`.
    ///
    /// `entity_id` is only consulted for [`AccessLevel::OwnerOrAdmin`].
    pub async fn decide(
        &self,
        rule: &AccessRule,
        identity: &IdentityContext,
        entity_id: Option<EntityId>,
    ) -> Decision {
        if rule.is_skipped() {
            return Decision::Allow(None);
        }

        match rule.level() {
            AccessLevel::Public => Decision::Allow(None),
            AccessLevel::Authenticated => {
                if identity.is_authenticated() {
                    Decision::Allow(None)
                } else {
                    Decision::Deny(Error::Unauthenticated)
                }
            }
            AccessLevel::AdminOnly => {
                if !identity.is_authenticated() {
                    Decision::Deny(Error::Unauthenticated)
                } else if identity.is_admin() {
                    Decision::Allow(None)
                } else {
                    Decision::Deny(Error::forbidden("admin role required"))
                }
            }
            AccessLevel::OwnerOrAdmin => match self.owner_or_admin(rule, identity, entity_id).await {
                Ok(entity) => Decision::Allow(entity),
                Err(err) => Decision::Deny(err),
            },
        }
    }

    async fn owner_or_admin(
        &self,
        rule: &AccessRule,
        identity: &IdentityContext,
        entity_id: Option<EntityId>,
    ) -> Result<Option<LoadedEntity>, Error> {
        let Some(caller) = identity.caller_id() else {
            return Err(Error::Unauthenticated);
        };
        if identity.is_admin() {
            log::debug!("Admin {caller} bypasses ownership check");
            return Ok(None);
        }

        let entity_type = rule
            .protected_type()
            .ok_or_else(|| Error::config("OWNER_OR_ADMIN rule names no entity type"))?;
        let id = entity_id.ok_or_else(|| {
            Error::config(format!(
                "no {entity_type} id supplied in parameter '{}'",
                rule.entity_id_param_name()
            ))
        })?;
        let ownership = self.catalog.ownership(entity_type).ok_or_else(|| {
            Error::config(format!("entity type {entity_type} is not registered"))
        })?;

        let entity = self.loader.load(entity_type, id).await?;
        let owner = resolve_owner_id(&*entity, ownership)?;

        if owner == caller {
            Ok(Some(LoadedEntity::new(entity)))
        } else {
            log::debug!("{entity_type} {id} is owned by {owner}, not {caller}");
            Err(Error::forbidden(format!("not the owner of {entity_type} {id}")))
        }
    }
}
