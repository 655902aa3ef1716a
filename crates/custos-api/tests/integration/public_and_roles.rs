//! PUBLIC, AUTHENTICATED and ADMIN_ONLY routes.

use http::StatusCode;

use crate::common::{assert_denial, TestHarness, ADMIN, ALICE};

#[tokio::test]
async fn test_health_is_public() {
    let harness = TestHarness::new().await;
    for token in [None, Some(ALICE), Some(ADMIN)] {
        let (status, json) = harness.get("/api/health", token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }
}

#[tokio::test]
async fn test_my_orders_requires_authentication() {
    let harness = TestHarness::new().await;

    let (status, json) = harness.get("/api/orders/my-orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_denial(&json, "unauthenticated", 401);
    assert_eq!(json["error"]["message"], "Authentication required");
}

#[tokio::test]
async fn test_my_orders_lists_only_own_orders() {
    let harness = TestHarness::new().await;

    let (status, json) = harness.get("/api/orders/my-orders", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![100, 102, 103]);
}

#[tokio::test]
async fn test_order_listing_is_admin_only() {
    let harness = TestHarness::new().await;

    let (status, json) = harness.get("/api/orders", Some(ADMIN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 5);

    let (status, json) = harness.get("/api/orders", Some(ALICE)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_denial(&json, "forbidden", 403);
    assert_eq!(json["error"]["message"], "Admin access required");

    let (status, json) = harness.get("/api/orders", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_denial(&json, "unauthenticated", 401);
}
