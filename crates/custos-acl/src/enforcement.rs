//! Enforcement point.
//!
//! Runs before an operation's business logic: looks up the operation's rule,
//! extracts the entity id parameter, asks the [`AccessDecisionEngine`] and
//! turns the decision into a terminal [`Outcome`]. Each evaluation is
//! independent and final; nothing here is retried.

use std::fmt;
use std::sync::Arc;

use custos_auth::IdentityContext;

use crate::engine::{AccessDecisionEngine, Decision};
use crate::entity::{EntityId, LoadedEntity};
use crate::error::{DenialKind, Error, Result};
use crate::loader::EntityLoader;
use crate::policy::AccessRule;
use crate::registry::{Operation, OperationId, RuleRegistry};

const AUTHENTICATION_REQUIRED: &str = "Authentication required";
const EVALUATION_FAILED: &str = "Access could not be evaluated";

/// Caller-facing description of a refused operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    kind: DenialKind,
    message: String,
    cause: Error,
}

impl Denial {
    /// Build the denial for `cause` under `rule`.
    ///
    /// The rule's custom message replaces the default for authentication and
    /// authorization refusals. Not-found keeps its precise message and
    /// internal faults never echo their cause.
    pub fn from_error(cause: Error, rule: Option<&AccessRule>) -> Self {
        let kind = cause.kind();
        let custom = rule.and_then(AccessRule::custom_message);
        let message = match kind {
            DenialKind::Unauthenticated => custom.unwrap_or(AUTHENTICATION_REQUIRED).to_string(),
            DenialKind::Forbidden => match (custom, rule) {
                (Some(message), _) => message.to_string(),
                (None, Some(rule)) => rule.level().default_denied_message().to_string(),
                (None, None) => "Access denied".to_string(),
            },
            DenialKind::NotFound => cause.to_string(),
            DenialKind::Internal => EVALUATION_FAILED.to_string(),
        };
        Self {
            kind,
            message,
            cause,
        }
    }

    /// Outcome class.
    pub fn kind(&self) -> DenialKind {
        self.kind
    }

    /// Message for the caller.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying error, for logs only.
    pub fn cause(&self) -> &Error {
        &self.cause
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Terminal state of one evaluation.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Business logic may run. Carries the entity loaded during evaluation.
    Allowed {
        /// The protected entity, when the engine had to load it.
        entity: Option<LoadedEntity>,
    },
    /// A decision was reached and it is a refusal.
    Denied(Denial),
    /// The operation is wired incorrectly; no decision was possible.
    ConfigError(Denial),
}

impl Outcome {
    /// Whether the operation may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Outcome::Allowed { .. })
    }

    /// The denial, for both refusals and configuration errors.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Outcome::Allowed { .. } => None,
            Outcome::Denied(denial) | Outcome::ConfigError(denial) => Some(denial),
        }
    }
}

/// Gate in front of every declared operation.
#[derive(Debug, Clone)]
pub struct EnforcementPoint {
    registry: Arc<RuleRegistry>,
    engine: AccessDecisionEngine,
}

impl EnforcementPoint {
    /// Create an enforcement point over a validated registry.
    pub fn new(registry: Arc<RuleRegistry>, loader: Arc<dyn EntityLoader>) -> Self {
        let engine = AccessDecisionEngine::new(registry.catalog().clone(), loader);
        Self { registry, engine }
    }

    /// The rule registry.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Look up a declared operation. Undeclared operations are a wiring
    /// error, reported when routes are assembled.
    pub fn operation(&self, id: &OperationId) -> Result<&Operation> {
        self.registry
            .get(id)
            .ok_or_else(|| Error::config(format!("operation '{id}' has no declared access rule")))
    }

    /// Evaluate `operation` for `identity` with the request's parameters.
    pub async fn evaluate<I, K, V>(
        &self,
        operation: &OperationId,
        params: I,
        identity: &IdentityContext,
    ) -> Outcome
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let op = match self.operation(operation) {
            Ok(op) => op,
            Err(err) => return config_error(err, None),
        };
        let rule = op.rule();

        if rule.is_skipped() {
            log::debug!("Access check skipped for '{operation}'");
            return Outcome::Allowed { entity: None };
        }

        let entity_id = if rule.level().requires_entity() {
            match extract_entity_id(rule, params) {
                Ok(id) => Some(id),
                Err(err) => return config_error(err, Some(rule)),
            }
        } else {
            None
        };

        match self.engine.decide(rule, identity, entity_id).await {
            Decision::Allow(entity) => {
                log::debug!("Allowed '{operation}' for {identity}");
                Outcome::Allowed { entity }
            }
            Decision::Deny(err) if err.is_configuration() => config_error(err, Some(rule)),
            Decision::Deny(err) => {
                log::warn!("Denied '{operation}' for {identity}: {err}");
                Outcome::Denied(Denial::from_error(err, Some(rule)))
            }
        }
    }
}

fn config_error(err: Error, rule: Option<&AccessRule>) -> Outcome {
    log::error!("Access rule misconfigured: {err}");
    Outcome::ConfigError(Denial::from_error(err, rule))
}

fn extract_entity_id<I, K, V>(rule: &AccessRule, params: I) -> Result<EntityId>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let name = rule.entity_id_param_name();
    let raw = params
        .into_iter()
        .find(|(key, _)| key.as_ref() == name)
        .map(|(_, value)| value.as_ref().to_string())
        .ok_or_else(|| Error::config(format!("parameter '{name}' is absent")))?;
    raw.parse()
        .map_err(|_| Error::config(format!("parameter '{name}' is not an identifier: '{raw}'")))
}
