//! Silo cache node binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use silo_coordinator::CoordinatorClient;
use silo_core::config::AppConfig;
use silo_server::{AppState, create_router};
use silo_store::StoreClient;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Silo - a peer-assisted artifact cache node
#[derive(Parser, Debug)]
#[command(name = "silod")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SILO_CONFIG", default_value = "config/silod.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Silo v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();
    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!("No config file found at {}", args.config);
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SILO_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    // Bootstrap the content store before serving anything: a repository
    // that cannot initialize or configure is a fatal startup fault.
    let store = StoreClient::new(&config.store);
    store.init().await.context("store init failed")?;
    store
        .configure(
            config.store.api_port,
            config.store.gateway_port,
            config.store.swarm_port,
        )
        .await
        .context("store configure failed")?;
    let daemon = store
        .run_daemon()
        .await
        .context("store daemon failed to start")?;
    tracing::info!(pid = ?daemon.id(), "store daemon running");

    let coordinator =
        CoordinatorClient::new(&config.coordinator).context("coordinator client setup failed")?;

    let bind = config.server.bind.clone();
    let state = AppState::new(config, store, coordinator)
        .context("upstream client setup failed")?;
    let app = create_router(state);

    let addr: SocketAddr = bind.parse().context("invalid bind address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    // Unreachable in practice; keeps the daemon handle (and thus the store
    // process) alive for the server's whole lifetime.
    drop(daemon);
    Ok(())
}
