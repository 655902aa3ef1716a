//! Tower access-control middleware.
//!
//! `AccessLayer` guards one route. It reads the identity attached by
//! [`custos_auth::AuthLayer`] and the route's path parameters, awaits the
//! [`EnforcementPoint`], and only then forwards the request. Denials never
//! reach the inner service.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::response::{IntoResponse, Response};
use custos_acl::{Denial, DenialKind, EnforcementPoint, OperationId, Outcome};
use custos_auth::identity_from_parts;
use http::{Request, StatusCode};
use tower::{Layer, Service};

/// Tower `Layer` enforcing the access rule of one declared operation.
#[derive(Clone)]
pub struct AccessLayer {
    enforcement: Arc<EnforcementPoint>,
    operation: OperationId,
}

impl AccessLayer {
    /// Guard `operation`. Fails if the operation has no declared rule, so a
    /// route without a rule cannot be mounted.
    pub fn new(enforcement: Arc<EnforcementPoint>, operation: OperationId) -> custos_acl::Result<Self> {
        enforcement.operation(&operation)?;
        Ok(Self {
            enforcement,
            operation,
        })
    }

    /// Guard the HTTP route `method template`.
    pub fn for_route(
        enforcement: Arc<EnforcementPoint>,
        method: &str,
        template: &str,
    ) -> custos_acl::Result<Self> {
        Self::new(enforcement, OperationId::route(method, template))
    }

    /// The guarded operation.
    pub fn operation(&self) -> &OperationId {
        &self.operation
    }
}

impl<S> Layer<S> for AccessLayer {
    type Service = AccessService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessService {
            inner,
            enforcement: self.enforcement.clone(),
            operation: self.operation.clone(),
        }
    }
}

/// Tower `Service` produced by [`AccessLayer`].
///
/// On ALLOW the entity loaded during evaluation, if any, is inserted into
/// the request extensions as a [`custos_acl::LoadedEntity`].
#[derive(Clone)]
pub struct AccessService<S> {
    inner: S,
    enforcement: Arc<EnforcementPoint>,
    operation: OperationId,
}

impl<S> Service<Request<Body>> for AccessService<S>
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let enforcement = self.enforcement.clone();
        let operation = self.operation.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();
            let identity = identity_from_parts(&parts);

            let params: Vec<(String, String)> =
                match RawPathParams::from_request_parts(&mut parts, &()).await {
                    Ok(raw) => raw
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                    Err(rejection) => {
                        log::debug!("No path parameters for '{operation}': {rejection}");
                        Vec::new()
                    }
                };

            match enforcement.evaluate(&operation, params, &identity).await {
                Outcome::Allowed { entity } => {
                    if let Some(entity) = entity {
                        parts.extensions.insert(entity);
                    }
                    let req = Request::from_parts(parts, body);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Outcome::Denied(denial) | Outcome::ConfigError(denial) => {
                    Ok(denial_response(&denial))
                }
            }
        })
    }
}

/// HTTP status for a denial kind.
pub fn denial_status(kind: DenialKind) -> StatusCode {
    match kind {
        DenialKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        DenialKind::Forbidden => StatusCode::FORBIDDEN,
        DenialKind::NotFound => StatusCode::NOT_FOUND,
        DenialKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the JSON response for a denial.
pub fn denial_response(denial: &Denial) -> Response {
    json_error(
        denial_status(denial.kind()),
        denial.kind().as_str(),
        denial.message(),
    )
}

/// JSON error body shared by denials and handler failures.
///
/// Body: `{"error": {"category": <category>, "message": <message>}, "status": <code>}`.
pub fn json_error(status: StatusCode, category: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "error": {
            "category": category,
            "message": message,
        },
        "status": status.as_u16(),
    });

    let mut response = (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&body).unwrap_or_default(),
    )
        .into_response();

    if status == StatusCode::UNAUTHORIZED {
        response.headers_mut().insert(
            http::header::WWW_AUTHENTICATE,
            http::HeaderValue::from_static("Bearer"),
        );
    }

    response
}
