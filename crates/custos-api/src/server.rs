//! API server implementation

use std::sync::Arc;

use axum::Router;
use custos_acl::{EnforcementPoint, InMemoryStore, RuleRegistry};
use custos_auth::AuthLayer;
use tracing::Instrument;

use crate::config::CustosConfig;
use crate::domain;
use crate::error::{Error, Result};
use crate::routes::{self, AppState};

/// Custos API server
pub struct Server {
    config: CustosConfig,
    store: InMemoryStore,
    enforcement: Arc<EnforcementPoint>,
    router: Router,
}

impl Server {
    /// Build a server over the demo data set.
    pub async fn new(config: CustosConfig) -> Result<Self> {
        let store = InMemoryStore::new();
        domain::seed(&store).await;
        Self::with_store(config, store)
    }

    /// Build a server over an existing store.
    ///
    /// This is the startup validation pass: the entity catalog, every access
    /// rule, and every mounted route are checked here, and any configuration
    /// error aborts construction.
    pub fn with_store(config: CustosConfig, store: InMemoryStore) -> Result<Self> {
        config.validate()?;

        let catalog = Arc::new(domain::catalog()?);
        let registry = RuleRegistry::builder(catalog)
            .operations(routes::operations())
            .build()?;
        let enforcement = Arc::new(EnforcementPoint::new(
            Arc::new(registry),
            Arc::new(store.clone()),
        ));

        let state = AppState {
            store: store.clone(),
            enforcement: enforcement.clone(),
        };

        let provider = config.token_provider();
        if provider.is_empty() {
            tracing::warn!("No bearer tokens configured; every caller is anonymous");
        }
        let router = routes::router(state)?
            .layer(AuthLayer::new(Arc::new(provider), config.auth_config()));

        Ok(Self {
            config,
            store,
            enforcement,
            router,
        })
    }

    /// The application router, with identity and access layers applied.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The entity store backing the server.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// The enforcement point guarding every route.
    pub fn enforcement(&self) -> &Arc<EnforcementPoint> {
        &self.enforcement
    }

    /// The effective configuration.
    pub fn config(&self) -> &CustosConfig {
        &self.config
    }

    /// Bind the configured address and serve until the process ends.
    pub async fn run(self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::config(format!("cannot bind {addr}: {e}")))?;
        let local = listener.local_addr()?;

        let span = tracing::info_span!("server", addr = %local);
        async move {
            tracing::info!(
                operations = self.enforcement.registry().len(),
                "Custos listening"
            );
            axum::serve(listener, self.router).await?;
            Ok::<(), Error>(())
        }
        .instrument(span)
        .await
    }
}
