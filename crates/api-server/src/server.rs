//! API server — HTTP (REST) endpoints plus the Prometheus metrics exporter.

use crate::rest::{self, AppState};
use crate::swagger;
use axum::routing::{get, put};
use axum::Router;
use offer_bandit_engine::BanditEngine;
use offer_core::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the HTTP router over shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Bandit endpoints
        .route("/sample/", get(rest::handle_sample))
        .route("/feedback/", put(rest::handle_feedback))
        .route("/offer_ids/:offer_id/stats/", get(rest::handle_stats))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        .route("/api-docs/openapi.json", get(swagger::openapi_json))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ApiServer {
    config: AppConfig,
    engine: Arc<BanditEngine>,
}

impl ApiServer {
    pub fn new(config: AppConfig, engine: Arc<BanditEngine>) -> Self {
        Self { config, engine }
    }

    /// Start the HTTP REST server. Returns after a graceful shutdown.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState::new(self.engine.clone(), self.config.node_id.clone());
        let app = router(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
