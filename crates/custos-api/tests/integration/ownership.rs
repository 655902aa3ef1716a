//! OWNER_OR_ADMIN routes across the three ownership styles.

use http::StatusCode;

use crate::common::{assert_denial, TestHarness, ADMIN, ALICE, BOB};

#[tokio::test]
async fn test_owner_reads_own_order() {
    let harness = TestHarness::new().await;
    let (status, json) = harness.get("/api/orders/100", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 100);
    assert_eq!(json["user_id"], 5);
}

#[tokio::test]
async fn test_other_user_is_forbidden() {
    let harness = TestHarness::new().await;
    let (status, json) = harness.get("/api/orders/101", Some(ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_denial(&json, "forbidden", 403);
}

#[tokio::test]
async fn test_admin_reads_any_order() {
    let harness = TestHarness::new().await;
    let (status, json) = harness.get("/api/orders/101", Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user_id"], 9);
}

#[tokio::test]
async fn test_missing_order_is_not_found_for_owner() {
    let harness = TestHarness::new().await;
    let (status, json) = harness.get("/api/orders/999", Some(ALICE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_denial(&json, "not_found", 404);
}

#[tokio::test]
async fn test_missing_order_for_admin_reaches_handler() {
    // Admins bypass the load, so absence is reported by the handler.
    let harness = TestHarness::new().await;
    let (status, json) = harness.get("/api/orders/999", Some(ADMIN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Order 999 not found");
}

#[tokio::test]
async fn test_guest_order_is_forbidden_to_users() {
    let harness = TestHarness::new().await;
    let (status, _) = harness.get("/api/orders/104", Some(ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = harness.get("/api/orders/104", Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_anonymous_owner_route_is_unauthenticated() {
    let harness = TestHarness::new().await;
    let (status, json) = harness.get("/api/orders/100", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_denial(&json, "unauthenticated", 401);
}

#[tokio::test]
async fn test_non_numeric_id_is_internal_error() {
    let harness = TestHarness::new().await;
    let (status, json) = harness.get("/api/orders/abc", Some(ALICE)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_denial(&json, "internal", 500);
}

#[tokio::test]
async fn test_address_owned_through_user_relation() {
    let harness = TestHarness::new().await;

    let (status, json) = harness.get("/api/addresses/10", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["city"], "Portland");

    let (status, _) = harness.get("/api/addresses/10", Some(BOB)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_owns_itself() {
    let harness = TestHarness::new().await;

    let (status, json) = harness.get("/api/users/9", Some(BOB)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Bob");

    let (status, _) = harness.get("/api/users/9", Some(ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_own_order() {
    let harness = TestHarness::new().await;

    let (status, json) = harness.put("/api/orders/100/cancel", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cancelled");

    let (status, json) = harness.get("/api/orders/100", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cancelled");

    let (status, json) = harness.put("/api/orders/100/cancel", Some(ALICE)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["category"], "conflict");
}

#[tokio::test]
async fn test_cancel_foreign_order_uses_custom_message() {
    let harness = TestHarness::new().await;

    let (status, json) = harness.put("/api/orders/101/cancel", Some(ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"]["message"], "You can only cancel your own orders");

    // The order was not touched.
    let (_, json) = harness.get("/api/orders/101", Some(BOB)).await;
    assert_eq!(json["status"], "pending");
}

#[tokio::test]
async fn test_admin_cancels_any_order() {
    let harness = TestHarness::new().await;
    let (status, json) = harness.put("/api/orders/101/cancel", Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cancelled");
}
