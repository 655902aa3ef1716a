//! Route table and handlers of the demo shop API.
//!
//! Every route is declared twice in one place: once in [`operations`] with
//! its access rule, and once in [`router`] where the matching
//! [`AccessLayer`] is mounted. Mounting a route whose operation was never
//! declared fails when the router is built.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use custos_acl::{
    resolve_owner_id, AccessRule, Denial, EnforcementPoint, EntityId, InMemoryStore,
    LoadedEntity, Operation,
};
use custos_auth::{identity_from_parts, IdentityContext};
use http::request::Parts;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::{self, Order, User, UserAddress, ORDER, USER, USER_ADDRESS};
use crate::middleware::{denial_response, json_error, AccessLayer};

/// `GET`: liveness probe.
pub const HEALTH: &str = "/api/health";
/// `GET`: the caller's own orders.
pub const MY_ORDERS: &str = "/api/orders/my-orders";
/// `GET`: every order.
pub const ORDERS: &str = "/api/orders";
/// `GET`: one order.
pub const ORDER_BY_ID: &str = "/api/orders/{id}";
/// `PUT`: cancel one order.
pub const CANCEL_ORDER: &str = "/api/orders/{orderId}/cancel";
/// `POST`: cancel several orders.
pub const BULK_CANCEL: &str = "/api/orders/bulk-cancel";
/// `GET`: one address.
pub const ADDRESS_BY_ID: &str = "/api/addresses/{addressId}";
/// `GET`: one user.
pub const USER_BY_ID: &str = "/api/users/{id}";

/// Access declarations for every route.
pub fn operations() -> Vec<Operation> {
    vec![
        Operation::route("GET", HEALTH, AccessRule::public()),
        Operation::route("GET", MY_ORDERS, AccessRule::authenticated()),
        Operation::route("GET", ORDERS, AccessRule::admin_only()),
        Operation::route("GET", ORDER_BY_ID, AccessRule::owner_or_admin(ORDER)),
        Operation::route(
            "PUT",
            CANCEL_ORDER,
            AccessRule::owner_or_admin(ORDER)
                .entity_id_param("orderId")
                .denied_message("You can only cancel your own orders"),
        ),
        // Ownership is checked per order inside the handler.
        Operation::route("POST", BULK_CANCEL, AccessRule::skip()),
        Operation::route(
            "GET",
            ADDRESS_BY_ID,
            AccessRule::owner_or_admin(USER_ADDRESS).entity_id_param("addressId"),
        ),
        Operation::route("GET", USER_BY_ID, AccessRule::owner_or_admin(USER)),
    ]
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Entity storage.
    pub store: InMemoryStore,
    /// The enforcement point, also used for bespoke checks.
    pub enforcement: Arc<EnforcementPoint>,
}

/// Build the API router. Fails if a mounted route has no declared rule.
pub fn router(state: AppState) -> custos_acl::Result<Router> {
    let enforcement = state.enforcement.clone();
    let guard = |method: &str, path: &str| AccessLayer::for_route(enforcement.clone(), method, path);

    let router = Router::new()
        .route(HEALTH, get(health).route_layer(guard("GET", HEALTH)?))
        .route(MY_ORDERS, get(my_orders).route_layer(guard("GET", MY_ORDERS)?))
        .route(ORDERS, get(list_orders).route_layer(guard("GET", ORDERS)?))
        .route(
            ORDER_BY_ID,
            get(get_order).route_layer(guard("GET", ORDER_BY_ID)?),
        )
        .route(
            CANCEL_ORDER,
            put(cancel_order).route_layer(guard("PUT", CANCEL_ORDER)?),
        )
        .route(
            BULK_CANCEL,
            post(bulk_cancel).route_layer(guard("POST", BULK_CANCEL)?),
        )
        .route(
            ADDRESS_BY_ID,
            get(get_address).route_layer(guard("GET", ADDRESS_BY_ID)?),
        )
        .route(
            USER_BY_ID,
            get(get_user).route_layer(guard("GET", USER_BY_ID)?),
        )
        .with_state(state);

    Ok(router)
}

// ============================================================================
// Extractors and handler errors
// ============================================================================

/// The caller's identity; anonymous when none was attached.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub IdentityContext);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(identity_from_parts(parts)))
    }
}

/// Failures raised by handlers after access was granted.
#[derive(Debug)]
pub enum HandlerError {
    /// The access check failed inside a bespoke handler.
    Denied(Denial),
    /// The entity vanished between the access check and the handler.
    NotFound(String),
    /// The request conflicts with the entity's state.
    Conflict(String),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Denied(denial) => denial_response(&denial),
            HandlerError::NotFound(message) => {
                json_error(StatusCode::NOT_FOUND, "not_found", &message)
            }
            HandlerError::Conflict(message) => {
                json_error(StatusCode::CONFLICT, "conflict", &message)
            }
        }
    }
}

type HandlerResult<T> = Result<Json<T>, HandlerError>;

/// Use the entity the access layer loaded, or fetch it (admins bypass the load).
async fn loaded_or_fetch<T: custos_acl::Entity + Clone>(
    store: &InMemoryStore,
    loaded: Option<Extension<LoadedEntity>>,
    entity_type: custos_acl::EntityType,
    id: i64,
) -> Result<T, HandlerError> {
    let entity = match loaded {
        Some(Extension(entity)) => Some(entity),
        None => store
            .get(entity_type, EntityId::new(id))
            .await
            .map(LoadedEntity::new),
    };
    entity
        .as_ref()
        .and_then(domain::downcast::<T>)
        .ok_or_else(|| HandlerError::NotFound(format!("{entity_type} {id} not found")))
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn my_orders(State(state): State<AppState>, Caller(caller): Caller) -> Json<Vec<Order>> {
    let caller = caller.caller_id().map(|id| id.get());
    let orders = domain::all_orders(&state.store)
        .await
        .into_iter()
        .filter(|order| order.user_id.is_some() && order.user_id == caller)
        .collect();
    Json(orders)
}

async fn list_orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    Json(domain::all_orders(&state.store).await)
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    loaded: Option<Extension<LoadedEntity>>,
) -> HandlerResult<Order> {
    let order = loaded_or_fetch(&state.store, loaded, ORDER, id).await?;
    Ok(Json(order))
}

async fn cancel_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    loaded: Option<Extension<LoadedEntity>>,
) -> HandlerResult<Order> {
    let order: Order = loaded_or_fetch(&state.store, loaded, ORDER, order_id).await?;
    if !order.status.is_cancellable() {
        return Err(HandlerError::Conflict(format!(
            "Order {order_id} cannot be cancelled"
        )));
    }
    let cancelled = order.cancelled();
    state.store.insert(cancelled.clone()).await;
    log::info!("Order {order_id} cancelled");
    Ok(Json(cancelled))
}

/// Request body of the bulk cancel endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkCancelRequest {
    /// Orders to cancel.
    pub order_ids: Vec<i64>,
}

/// Outcome of one order in a bulk cancel.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedOrder {
    /// The order.
    pub id: i64,
    /// Why it was left alone.
    pub reason: String,
}

/// Response body of the bulk cancel endpoint.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct BulkCancelResponse {
    /// Orders now cancelled.
    pub cancelled: Vec<i64>,
    /// Orders left alone.
    pub skipped: Vec<SkippedOrder>,
}

async fn bulk_cancel(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<BulkCancelRequest>,
) -> HandlerResult<BulkCancelResponse> {
    let Some(caller_id) = caller.caller_id() else {
        return Err(HandlerError::Denied(Denial::from_error(
            custos_acl::Error::Unauthenticated,
            None,
        )));
    };
    let ownership = state.enforcement.registry().catalog().ownership(ORDER);

    let mut response = BulkCancelResponse::default();
    for id in request.order_ids {
        let skip = |reason: &str| SkippedOrder {
            id,
            reason: reason.to_string(),
        };
        let Some(order) = domain::find_order(&state.store, EntityId::new(id)).await else {
            response.skipped.push(skip("not found"));
            continue;
        };
        let owns = match ownership {
            Some(ownership) => resolve_owner_id(&order, ownership).is_ok_and(|o| o == caller_id),
            None => false,
        };
        if !caller.is_admin() && !owns {
            response.skipped.push(skip("not the owner"));
        } else if !order.status.is_cancellable() {
            response.skipped.push(skip("not cancellable"));
        } else {
            state.store.insert(order.cancelled()).await;
            response.cancelled.push(id);
        }
    }

    log::info!(
        "Bulk cancel by {caller}: {} cancelled, {} skipped",
        response.cancelled.len(),
        response.skipped.len()
    );
    Ok(Json(response))
}

async fn get_address(
    State(state): State<AppState>,
    Path(address_id): Path<i64>,
    loaded: Option<Extension<LoadedEntity>>,
) -> HandlerResult<UserAddress> {
    let address = loaded_or_fetch(&state.store, loaded, USER_ADDRESS, address_id).await?;
    Ok(Json(address))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    loaded: Option<Extension<LoadedEntity>>,
) -> HandlerResult<User> {
    let user = loaded_or_fetch(&state.store, loaded, USER, id).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use custos_acl::RuleRegistry;

    #[test]
    fn test_operations_pass_registration() {
        let catalog = Arc::new(domain::catalog().unwrap());
        let registry = RuleRegistry::builder(catalog)
            .operations(operations())
            .build()
            .unwrap();
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_cancel_route_uses_order_id_param() {
        let cancel = operations()
            .into_iter()
            .find(|op| op.id().as_str() == "PUT /api/orders/{orderId}/cancel")
            .unwrap();
        assert_eq!(cancel.params(), ["orderId".to_string()]);
        assert_eq!(cancel.rule().entity_id_param_name(), "orderId");
    }

    #[test]
    fn test_handler_error_status() {
        let resp = HandlerError::Conflict("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = HandlerError::NotFound("gone".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
