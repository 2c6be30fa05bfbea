//! Application state for the query server

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::service::{Providers, QueryService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Loaded core; `None` when startup failed
    service: Option<Arc<QueryService>>,
}

impl AppState {
    /// Wrap an already loaded (or failed) core
    pub fn new(config: RagConfig, service: Option<QueryService>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                service: service.map(Arc::new),
            }),
        }
    }

    /// Build providers and load the core, keeping the server up on failure
    pub async fn load(config: RagConfig) -> Self {
        tracing::info!("Initializing RAG application state...");

        let service = match Self::try_load(&config).await {
            Ok(service) => {
                tracing::info!("RAG core ready");
                Some(service)
            }
            Err(e) => {
                tracing::error!("FATAL: failed to initialize RAG core: {}", e);
                tracing::error!("Queries will be rejected until the server is restarted with a valid index");
                None
            }
        };

        Self::new(config, service)
    }

    async fn try_load(config: &RagConfig) -> Result<QueryService> {
        config.validate()?;
        let providers = Providers::from_config(config)?;

        tracing::info!("Checking {} at {}...", providers.grounding.name(), config.grounding.base_url);
        match providers.grounding.health_check().await {
            Ok(true) => tracing::info!("Grounding provider is reachable"),
            _ => tracing::warn!(
                "Grounding provider not reachable at {}; answers will use fallback messages",
                config.grounding.base_url
            ),
        }

        QueryService::load(config, providers).await
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// The loaded core, if startup succeeded
    pub fn service(&self) -> Option<&Arc<QueryService>> {
        self.inner.service.as_ref()
    }

    /// Check if ready
    pub fn is_ready(&self) -> bool {
        self.inner.service.is_some()
    }
}
