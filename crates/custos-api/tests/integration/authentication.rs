//! Identity handling in front of the access rules.

use http::StatusCode;

use crate::common::{assert_denial, test_config, TestHarness, ALICE};

#[tokio::test]
async fn test_unknown_token_continues_anonymous_by_default() {
    let harness = TestHarness::new().await;

    let (status, _) = harness.get("/api/health", Some("stolen-token")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = harness.get("/api/orders/100", Some("stolen-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_denial(&json, "unauthenticated", 401);
}

#[tokio::test]
async fn test_unknown_token_rejected_when_strict() {
    let harness = TestHarness::with_config(test_config(true)).await;

    let (status, json) = harness.get("/api/health", Some("stolen-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["category"], "authentication");

    let (status, _) = harness.get("/api/health", Some(ALICE)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = harness.get("/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
