//! Offer Bandit — chooses the best offer for each click with a UCB bandit
//! and learns from delayed reward feedback.
//!
//! Main entry point that initializes the engine and starts the server.

use clap::Parser;
use offer_api::ApiServer;
use offer_bandit_engine::{BanditEngine, OfferStore};
use offer_core::config::AppConfig;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "offer-bandit")]
#[command(about = "UCB bandit service for choosing offers from click feedback")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "OFFER_BANDIT__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "OFFER_BANDIT__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics exporter port (overrides config)
    #[arg(long, env = "OFFER_BANDIT__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Skip the Prometheus exporter
    #[arg(long, default_value_t = false)]
    no_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "offer_bandit=info,offer_bandit_engine=info,offer_api=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Offer Bandit starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        max_candidates = config.bandit.max_candidates,
        "Configuration loaded"
    );

    // Statistics and click assignments start empty on every boot.
    let store = Arc::new(OfferStore::new());
    let engine = Arc::new(
        BanditEngine::new(store).with_max_candidates(config.bandit.max_candidates),
    );

    let api_server = ApiServer::new(config.clone(), engine);

    if !cli.no_metrics {
        if let Err(e) = api_server.start_metrics().await {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Offer Bandit is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
