//! Common test utilities and harness for Custos API integration tests.

use axum::body::Body;
use axum::Router;
use custos_api::config::{AuthSection, CustosConfig};
use custos_api::Server;
use custos_auth::{TokenGrant, UserId};
use http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

/// Token of user 5, owner of orders 100, 102, 103 and address 10.
pub const ALICE: &str = "alice-token";
/// Token of user 9, owner of order 101 and address 11.
pub const BOB: &str = "bob-token";
/// Token of user 1, an administrator.
pub const ADMIN: &str = "admin-token";

fn grant(token: &str, user_id: i64, admin: bool) -> TokenGrant {
    TokenGrant {
        token: token.to_string(),
        user_id: UserId::new(user_id),
        admin,
    }
}

/// Configuration with the three test tokens.
pub fn test_config(reject_invalid_tokens: bool) -> CustosConfig {
    CustosConfig {
        auth: AuthSection {
            reject_invalid_tokens,
            tokens: vec![grant(ALICE, 5, false), grant(BOB, 9, false), grant(ADMIN, 1, true)],
        },
        ..CustosConfig::default()
    }
}

/// Test harness wrapping a server seeded with the demo data.
pub struct TestHarness {
    /// The server under test
    pub server: Server,
}

impl TestHarness {
    /// Lenient identity handling (unusable tokens continue anonymous).
    pub async fn new() -> Self {
        Self::with_config(test_config(false)).await
    }

    /// Harness over a custom configuration.
    pub async fn with_config(config: CustosConfig) -> Self {
        let server = Server::new(config).await.expect("server should build");
        Self { server }
    }

    fn router(&self) -> Router {
        self.server.router()
    }

    /// Send a request and decode the JSON response body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// `GET` helper.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    /// `PUT` helper without body.
    pub async fn put(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, None).await
    }

    /// `POST` helper with a JSON body.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }
}

/// Assert the standard denial body.
pub fn assert_denial(json: &Value, category: &str, status: u16) {
    assert_eq!(json["error"]["category"], category, "body: {json}");
    assert_eq!(json["status"], status, "body: {json}");
    assert!(json["error"]["message"].is_string(), "body: {json}");
}
