//! Operation declarations and the rule registry.
//!
//! Each API operation is declared once with its parameters and its
//! [`AccessRule`]. [`RuleRegistryBuilder::build`] is the startup validation
//! pass: every rule is checked against the operation's parameters and the
//! [`EntityCatalog`], so wiring mistakes abort startup instead of surfacing
//! on the first call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::EntityCatalog;
use crate::error::{Error, Result};
use crate::policy::AccessRule;

/// Identifier of an operation, e.g. `"GET /api/orders/{id}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(String);

impl OperationId {
    /// Creates an operation id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// The id of an HTTP route: `"{METHOD} {template}"`.
    pub fn route(method: &str, template: &str) -> Self {
        Self(format!("{} {template}", method.to_ascii_uppercase()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OperationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Parameter names of a route template: `{name}` and `{*name}` segments.
pub fn route_params(template: &str) -> Vec<String> {
    template
        .split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| name.trim_start_matches('*').to_string())
        .collect()
}

/// One operation and its access declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    id: OperationId,
    params: Vec<String>,
    rule: AccessRule,
}

impl Operation {
    /// Declare an operation with no parameters.
    pub fn new(id: impl Into<OperationId>, rule: AccessRule) -> Self {
        Self {
            id: id.into(),
            params: Vec::new(),
            rule,
        }
    }

    /// Declare an HTTP route. The id is `"{METHOD} {template}"` and the
    /// parameters are taken from the template.
    pub fn route(method: &str, template: &str, rule: AccessRule) -> Self {
        Self {
            id: OperationId::route(method, template),
            params: route_params(template),
            rule,
        }
    }

    /// Declare an additional parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(name.into());
        self
    }

    /// The operation id.
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    /// Declared parameter names.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The access rule.
    pub fn rule(&self) -> &AccessRule {
        &self.rule
    }

    fn declares(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }
}

/// Check one operation's rule against its parameters and the catalog.
fn validate(op: &Operation, catalog: &EntityCatalog) -> Result<()> {
    let rule = op.rule();
    if rule.is_skipped() {
        return Ok(());
    }

    if let Some(entity_type) = rule.protected_type() {
        if !catalog.contains(entity_type) {
            return Err(Error::config(format!(
                "operation '{}' protects unregistered entity type {entity_type}",
                op.id()
            )));
        }
    }

    if rule.level().requires_entity() {
        if rule.protected_type().is_none() {
            return Err(Error::config(format!(
                "operation '{}' is {} but names no entity type",
                op.id(),
                rule.level()
            )));
        }
        let param = rule.entity_id_param_name();
        if !op.declares(param) {
            return Err(Error::config(format!(
                "operation '{}' declares no parameter '{param}'",
                op.id()
            )));
        }
    }

    Ok(())
}

/// Builder collecting operation declarations.
#[derive(Debug)]
pub struct RuleRegistryBuilder {
    catalog: Arc<EntityCatalog>,
    operations: Vec<Operation>,
}

impl RuleRegistryBuilder {
    /// Add one operation.
    pub fn operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Add several operations.
    pub fn operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(ops);
        self
    }

    /// Validate every declaration and freeze the registry.
    pub fn build(self) -> Result<RuleRegistry> {
        let mut rules = HashMap::with_capacity(self.operations.len());
        for op in self.operations {
            if let Err(err) = validate(&op, &self.catalog) {
                log::error!("Rejecting access rule: {err}");
                return Err(err);
            }
            if rules.contains_key(op.id()) {
                return Err(Error::config(format!(
                    "operation '{}' declared more than once",
                    op.id()
                )));
            }
            log::debug!("Registered {} for '{}'", op.rule().level(), op.id());
            rules.insert(op.id().clone(), op);
        }

        log::info!("Access rules registered for {} operations", rules.len());
        Ok(RuleRegistry {
            catalog: self.catalog,
            rules,
        })
    }
}

/// Validated, immutable map from operation to access rule.
#[derive(Debug)]
pub struct RuleRegistry {
    catalog: Arc<EntityCatalog>,
    rules: HashMap<OperationId, Operation>,
}

impl RuleRegistry {
    /// Start building a registry over `catalog`.
    pub fn builder(catalog: Arc<EntityCatalog>) -> RuleRegistryBuilder {
        RuleRegistryBuilder {
            catalog,
            operations: Vec::new(),
        }
    }

    /// Look up an operation.
    pub fn get(&self, id: &OperationId) -> Option<&Operation> {
        self.rules.get(id)
    }

    /// The entity catalog the rules were validated against.
    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no operations are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over all operations.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.rules.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::*;
    use crate::ownership::OwnershipDescriptor;

    fn catalog() -> Arc<EntityCatalog> {
        Arc::new(
            EntityCatalog::builder()
                .register::<User>(OwnershipDescriptor::owner_is_self())
                .register::<Order>(OwnershipDescriptor::path("user.id"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_route_params() {
        assert_eq!(route_params("/api/orders/{orderId}/cancel"), vec!["orderId"]);
        assert_eq!(
            route_params("/api/users/{userId}/addresses/{id}"),
            vec!["userId", "id"]
        );
        assert_eq!(route_params("/files/{*path}"), vec!["path"]);
        assert!(route_params("/api/health").is_empty());
    }

    #[test]
    fn test_operation_route_id() {
        let op = Operation::route("put", "/api/orders/{orderId}/cancel", AccessRule::public());
        assert_eq!(op.id().as_str(), "PUT /api/orders/{orderId}/cancel");
        assert_eq!(op.params(), ["orderId".to_string()]);
    }

    #[test]
    fn test_build_valid_registry() {
        let registry = RuleRegistry::builder(catalog())
            .operation(Operation::route("GET", "/api/health", AccessRule::public()))
            .operation(Operation::route(
                "GET",
                "/api/orders/{id}",
                AccessRule::owner_or_admin(ORDER),
            ))
            .operation(Operation::new("orders.list", AccessRule::admin_only()))
            .build()
            .unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get(&OperationId::from("orders.list")).is_some());
        assert!(registry.get(&OperationId::from("orders.delete")).is_none());
    }

    #[test]
    fn test_missing_param_rejected_at_registration() {
        let err = RuleRegistry::builder(catalog())
            .operation(
                Operation::new("orders.cancel", AccessRule::owner_or_admin(ORDER).entity_id_param("orderId"))
                    .param("id"),
            )
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(
            err.to_string().contains("declares no parameter 'orderId'"),
            "got: {err}"
        );
    }

    #[test]
    fn test_owner_rule_without_entity_type_rejected() {
        let err = RuleRegistry::builder(catalog())
            .operation(
                Operation::new(
                    "orders.get",
                    AccessRule::new(crate::policy::AccessLevel::OwnerOrAdmin),
                )
                .param("id"),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("names no entity type"), "got: {err}");
    }

    #[test]
    fn test_unregistered_entity_type_rejected() {
        let err = RuleRegistry::builder(catalog())
            .operation(
                Operation::new("tickets.get", AccessRule::owner_or_admin(TICKET)).param("id"),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unregistered entity type Ticket"));
    }

    #[test]
    fn test_duplicate_operation_rejected() {
        let err = RuleRegistry::builder(catalog())
            .operation(Operation::new("health", AccessRule::public()))
            .operation(Operation::new("health", AccessRule::public()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_skip_rule_needs_no_wiring() {
        let registry = RuleRegistry::builder(catalog())
            .operation(Operation::new("orders.bulk_cancel", AccessRule::skip()))
            .build()
            .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_non_owner_levels_ignore_missing_id_param() {
        // The default "id" parameter only matters for OWNER_OR_ADMIN.
        let registry = RuleRegistry::builder(catalog())
            .operation(Operation::new("orders.list", AccessRule::admin_only()))
            .operation(Operation::new("orders.mine", AccessRule::authenticated()))
            .build()
            .unwrap();
        assert_eq!(registry.iter().count(), 2);
    }
}
