//! Tower identity middleware.
//!
//! `AuthLayer` and `AuthService` wrap any inner service with identity
//! resolution. Generic over `IdentityProvider`; plug in any provider.
//! Every request leaves this layer carrying an [`IdentityContext`], possibly
//! anonymous; authorization is decided further down by the access rules.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::{AuthConfig, AuthError, IdentityContext, IdentityProvider};

/// Tower `Layer` that attaches an [`IdentityContext`] to every request.
#[derive(Clone)]
pub struct AuthLayer<P: IdentityProvider> {
    provider: Arc<P>,
    config: AuthConfig,
}

impl<P: IdentityProvider> AuthLayer<P> {
    /// Create a new auth layer with the given provider and config.
    pub fn new(provider: Arc<P>, config: AuthConfig) -> Self {
        Self { provider, config }
    }
}

impl<P: IdentityProvider, S> Layer<S> for AuthLayer<P> {
    type Service = AuthService<P, S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            provider: self.provider.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that resolves the caller before forwarding requests.
///
/// Inserts `IdentityContext` into request extensions where it's available to
/// the access layer and downstream handlers.
#[derive(Clone)]
pub struct AuthService<P: IdentityProvider, S> {
    inner: S,
    provider: Arc<P>,
    config: AuthConfig,
}

impl<P, S> Service<Request<Body>> for AuthService<P, S>
where
    P: IdentityProvider,
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let provider = self.provider.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let bearer = bearer_token(&req).map(|token| token.map(str::to_string));
            let resolved = match bearer {
                Ok(None) => Ok(IdentityContext::anonymous()),
                Ok(Some(token)) => provider.identify(&token).await,
                Err(err) => Err(err),
            };

            let identity = match resolved {
                Ok(identity) => identity,
                Err(err) if config.reject_invalid_tokens || !err.is_client_error() => {
                    log::warn!("Identity resolution failed: {err}");
                    return Ok(auth_error_response(&err));
                }
                Err(err) => {
                    log::warn!("Ignoring unusable credentials: {err}");
                    IdentityContext::anonymous()
                }
            };

            log::debug!("Request identity: {identity}");
            req.extensions_mut().insert(identity);
            let resp = inner
                .call(req)
                .await
                .unwrap_or_else(|infallible| match infallible {});
            Ok(resp.into_response())
        })
    }
}

/// Bearer token of the request; `Ok(None)` when no Authorization header is sent.
fn bearer_token(req: &Request<Body>) -> Result<Option<&str>, AuthError> {
    let Some(value) = req.headers().get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("Authorization header is not ASCII".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("expected the Bearer scheme".to_string()))?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(Some(token))
}

/// Build a 401 (or 500 for provider outages) JSON response.
fn auth_error_response(err: &AuthError) -> axum::response::Response {
    let status = err.status();
    let body = serde_json::json!({
        "error": {
            "category": "authentication",
            "message": err.to_string(),
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
