//! Shelf server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use shelf_client::{BestSellersSource, NytClient};
use shelf_core::config::AppConfig;
use shelf_metadata::MetadataStore;
use shelf_server::{AppState, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shelf - a caching proxy for the NYT best sellers history
#[derive(Parser, Debug)]
#[command(name = "shelfd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SHELF_CONFIG", default_value = "config/shelf.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Shelf v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration (file is optional, env vars can provide/override everything)
    let config_path = std::path::Path::new(&args.config);
    let mut figment = Figment::new();

    if config_path.exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::info!(
            "No config file found at {}, using defaults and environment variables",
            args.config
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("SHELF_").split("__"))
        .extract()
        .context("failed to load configuration")?;
    config
        .validate()
        .map_err(shelf_core::Error::InvalidConfig)
        .context("invalid configuration")?;

    if config.upstream.api_key.is_none() {
        tracing::warn!("No upstream API key configured (SHELF_UPSTREAM__API_KEY); requests will likely be rejected");
    }

    // Register Prometheus metrics
    if config.server.metrics_enabled {
        shelf_server::metrics::register_metrics();
        tracing::info!("Prometheus metrics registered");
    }

    // Initialize metadata store
    let metadata = shelf_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata store")?;
    metadata
        .health_check()
        .await
        .context("metadata store health check failed")?;
    tracing::info!("Metadata store initialized");

    // Build the upstream client once; it is immutable from here on
    let source: Arc<dyn BestSellersSource> = Arc::new(
        NytClient::from_config(&config.upstream).context("failed to build upstream client")?,
    );
    tracing::info!(
        base_url = %config.upstream.base_url,
        retry_times = config.upstream.retry_times,
        retry_delay_ms = config.upstream.retry_delay_ms,
        "Upstream client initialized"
    );

    let state = AppState::new(config.clone(), source, metadata);
    let app = create_router(state);

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
