//! Auth-specific error types.

/// Errors that can occur while resolving a caller identity.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header or bearer token present.
    #[error("missing authentication token")]
    MissingToken,

    /// Token format is invalid.
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    /// Token is well-formed but does not map to a known identity.
    #[error("unknown or revoked token")]
    UnknownToken,

    /// The identity provider could not be reached or timed out.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl AuthError {
    /// HTTP status of a request rejected with this error.
    pub fn status(&self) -> http::StatusCode {
        if self.is_client_error() {
            http::StatusCode::UNAUTHORIZED
        } else {
            http::StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Whether this error should result in a 401 (vs. a 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken | AuthError::InvalidFormat(_) | AuthError::UnknownToken
        )
    }
}
