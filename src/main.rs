mod api;
mod collector;
mod config;
mod db;
mod error;
mod fetcher;
mod normalize;
mod types;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::{router, ApiState, HealthState};
use crate::collector::Collector;
use crate::config::Config;
use crate::db::DrawStore;
use crate::error::Result;
use crate::fetcher::HttpDrawSource;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let store = DrawStore::connect(&cfg.db_path).await?;
    store.ensure_schema().await?;
    info!("Database ready at {}", cfg.db_path);

    // --- Collector ---
    let source = HttpDrawSource::new(&cfg)?;
    let health = Arc::new(HealthState::new());
    let collector = Arc::new(Collector::new(source, store.clone(), Arc::clone(&health)));
    info!(
        upstream = %cfg.upstream_url,
        interval_secs = cfg.poll_interval_secs,
        timeout_secs = cfg.fetch_timeout_secs,
        "Polling upstream draw history"
    );

    let scheduler = tokio::spawn(
        Arc::clone(&collector).run(Duration::from_secs(cfg.poll_interval_secs)),
    );

    // --- HTTP API server ---
    let api_state = ApiState {
        store: store.clone(),
        collector,
        health,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down: stopping collector and closing database");
    // Also aborts the tick in flight, releasing its pooled connection.
    scheduler.abort();
    store.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
