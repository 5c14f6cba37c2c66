//! Planner heatmap HTTP server binary.
//!
//! Loads configuration, starts the poller against the configured job source
//! and serves the latest heatmap over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Poll a local export
//! HEATMAP_SOURCE_URL=./jobs.json cargo run --bin heatmap-server
//!
//! # Poll the planner's job endpoint every 2 seconds
//! HEATMAP_SOURCE_URL=http://erp.local/api/workspace/jobs \
//!   HEATMAP_POLL_INTERVAL_MS=2000 cargo run --bin heatmap-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)
//! - `HEATMAP_*`: see [`planner_heatmap::config`]

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use planner_heatmap::config::HeatmapConfig;
use planner_heatmap::http::{create_router, AppState};
use planner_heatmap::services::poller::Poller;
use planner_heatmap::services::preferences::{FilePreferenceStore, ViewPreferences};
use planner_heatmap::services::source::fetcher_for_source;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting planner heatmap server");

    let config = HeatmapConfig::load().context("Failed to load configuration")?;

    let preferences = FilePreferenceStore::new(
        &config.preferences.path,
        ViewPreferences {
            week_start: config.layout.week_start,
            ..Default::default()
        },
    );
    let state = AppState::new(&config, Arc::new(preferences));

    let fetcher = fetcher_for_source(&config.poller.source_url, config.request_timeout())?;
    let poller = Poller::new(fetcher, config.poll_interval())?;

    let publisher = state.clone();
    poller.start(move |event| publisher.publish(event.snapshot).map(|_| ()));

    let app = create_router(state);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;

    info!("Server listening on http://{}", addr);
    info!("Heatmap: http://{}/v1/heatmap", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.destroy().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
