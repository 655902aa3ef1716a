//! Table-driven identity provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{AuthError, IdentityContext, IdentityFuture, IdentityProvider, UserId};

/// One configured bearer token and the identity it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// The bearer token value.
    pub token: String,
    /// User the token authenticates as.
    pub user_id: UserId,
    /// Whether the user holds the admin role.
    #[serde(default)]
    pub admin: bool,
}

/// Resolves bearer tokens from a fixed in-memory table.
///
/// Intended for development servers and tests; production deployments plug
/// in a provider that verifies real credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    grants: HashMap<String, IdentityContext>,
}

impl StaticTokenProvider {
    /// Build a provider from a list of grants. Later duplicates win.
    pub fn new(grants: impl IntoIterator<Item = TokenGrant>) -> Self {
        let grants = grants
            .into_iter()
            .map(|g| {
                let identity = if g.admin {
                    IdentityContext::admin(g.user_id)
                } else {
                    IdentityContext::user(g.user_id)
                };
                (g.token, identity)
            })
            .collect();
        Self { grants }
    }

    /// Number of configured tokens.
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Whether no tokens are configured.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl IdentityProvider for StaticTokenProvider {
    fn identify(&self, token: &str) -> IdentityFuture<'_> {
        let result = if token.trim().is_empty() {
            Err(AuthError::InvalidFormat("empty bearer token".to_string()))
        } else {
            self.grants
                .get(token)
                .copied()
                .ok_or(AuthError::UnknownToken)
        };
        Box::pin(async move { result })
    }
}
