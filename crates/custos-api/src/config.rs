//! Server configuration.
//!
//! Loaded from a TOML file, falling back to defaults when no file is given.
//! The bind address can be overridden through `CUSTOS_BIND` and the CLI.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [auth]
//! reject_invalid_tokens = false
//!
//! [[auth.tokens]]
//! token = "alice-token"
//! user_id = 5
//! ```

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;

use custos_auth::{AuthConfig, StaticTokenProvider, TokenGrant};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding `server.bind`.
pub const BIND_ENV: &str = "CUSTOS_BIND";

/// Bind address used when none is configured.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CustosConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Identity settings.
    pub auth: AuthSection,
}

/// `[server]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// `[auth]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSection {
    /// Answer 401 for unresolvable bearer tokens instead of continuing anonymous.
    pub reject_invalid_tokens: bool,
    /// Static bearer tokens.
    pub tokens: Vec<TokenGrant>,
}

impl CustosConfig {
    /// Load from `path`, or use defaults when `path` is `None`. Environment
    /// overrides are applied and the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::io_with_path(e, path))?;
                log::debug!("Loaded configuration from {}", path.display());
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        let config = config.with_bind_override(std::env::var(BIND_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid TOML: {e}")))
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Replace the bind address when `bind` is set and non-blank.
    pub fn with_bind_override(mut self, bind: Option<String>) -> Self {
        if let Some(bind) = bind.filter(|b| !b.trim().is_empty()) {
            log::debug!("Bind address overridden: {bind}");
            self.server.bind = bind.trim().to_string();
        }
        self
    }

    /// Check the bind address and the token table.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        let mut seen = HashSet::new();
        for grant in &self.auth.tokens {
            if grant.token.trim().is_empty() {
                return Err(Error::config(format!(
                    "blank token configured for user {}",
                    grant.user_id
                )));
            }
            if !seen.insert(grant.token.as_str()) {
                return Err(Error::config(format!(
                    "token for user {} configured more than once",
                    grant.user_id
                )));
            }
        }
        Ok(())
    }

    /// The parsed bind address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse()
            .map_err(|e| Error::config(format!("invalid bind address '{}': {e}", self.server.bind)))
    }

    /// Settings for the identity middleware.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            reject_invalid_tokens: self.auth.reject_invalid_tokens,
        }
    }

    /// Identity provider over the configured tokens.
    pub fn token_provider(&self) -> StaticTokenProvider {
        StaticTokenProvider::new(self.auth.tokens.iter().cloned())
    }
}
