//! Application state shared across handlers.

use silo_coordinator::CoordinatorClient;
use silo_core::config::AppConfig;
use silo_store::StoreClient;
use std::sync::Arc;
use std::time::Duration;

/// Total timeout for one upstream proxy call, covering the body.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<StoreClient>,
    pub coordinator: Arc<CoordinatorClient>,
    /// Client for proxying from the substituter. Same transport policy as
    /// coordinator calls: no certificate verification (private deployment
    /// network), 60s total, no pooling across calls.
    pub upstream: reqwest::Client,
    /// Substituter base URL, normalized without a trailing slash.
    pub substituter: String,
}

impl AppState {
    /// Assemble state from configuration and already-bootstrapped clients.
    pub fn new(
        config: AppConfig,
        store: StoreClient,
        coordinator: CoordinatorClient,
    ) -> reqwest::Result<Self> {
        let upstream = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(UPSTREAM_TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()?;
        let substituter = config.substituter.url.trim_end_matches('/').to_string();

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            coordinator: Arc::new(coordinator),
            upstream,
            substituter,
        })
    }
}
