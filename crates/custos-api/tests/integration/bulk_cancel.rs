//! The skip-rule bulk endpoint and its per-order ownership filtering.

use http::StatusCode;
use serde_json::json;

use crate::common::{assert_denial, TestHarness, ADMIN, ALICE};

#[tokio::test]
async fn test_bulk_cancel_filters_by_ownership() {
    let harness = TestHarness::new().await;
    let (status, json) = harness
        .post(
            "/api/orders/bulk-cancel",
            Some(ALICE),
            json!({ "order_ids": [100, 101, 103, 999] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cancelled"], json!([100]));

    let skipped = json["skipped"].as_array().unwrap();
    let reason = |id: i64| {
        skipped
            .iter()
            .find(|s| s["id"] == id)
            .map(|s| s["reason"].as_str().unwrap().to_string())
    };
    assert_eq!(reason(101).as_deref(), Some("not the owner"));
    assert_eq!(reason(103).as_deref(), Some("not cancellable"));
    assert_eq!(reason(999).as_deref(), Some("not found"));
}

#[tokio::test]
async fn test_bulk_cancel_admin_cancels_everything_pending() {
    let harness = TestHarness::new().await;
    let (status, json) = harness
        .post(
            "/api/orders/bulk-cancel",
            Some(ADMIN),
            json!({ "order_ids": [100, 101, 104] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cancelled"], json!([100, 101, 104]));
}

#[tokio::test]
async fn test_bulk_cancel_rejects_anonymous_in_handler() {
    let harness = TestHarness::new().await;
    let (status, json) = harness
        .post("/api/orders/bulk-cancel", None, json!({ "order_ids": [100] }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_denial(&json, "unauthenticated", 401);
}
