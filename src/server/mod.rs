//! HTTP server.
//!
//! Wires the report routes onto an axum router and runs it until SIGINT
//! or SIGTERM.

pub mod handlers;

use crate::config::{Config, ReportConfig};
use crate::tracker::{HttpTracker, TrackerApi};
use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<dyn TrackerApi>,
    pub report: ReportConfig,
}

impl AppState {
    pub fn new(tracker: Arc<dyn TrackerApi>, report: ReportConfig) -> Self {
        Self { tracker, report }
    }
}

/// Build the router with all report routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/features/{projects}/{api_key}", get(handlers::features_report))
        .route("/status/{projects}/{api_key}", get(handlers::status_report))
        .route("/{projects}/{api_key}", get(handlers::accepted_report))
        .with_state(state)
}

/// Bind the configured address and serve until shutdown.
pub async fn serve(config: &Config) -> Result<()> {
    let tracker = HttpTracker::new(&config.tracker).context("Failed to create tracker client")?;
    let state = AppState::new(Arc::new(tracker), config.report.clone());
    let app = build_router(state);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Tracker API: {}", config.tracker.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
