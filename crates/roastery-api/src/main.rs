//! Roastery API Server
//!
//! REST API server for the Roastery coffee catalog.

use anyhow::Context;
use roastery_api::{create_router, state::AppState};
use roastery_core::{config::AppConfig, LoggingConfig, PgStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", logging.level)));

    if logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);
    config.validate().context("invalid configuration")?;

    let addr = config.server.bind_addr();

    // Create application state
    let state = if config.database.url.is_some() {
        let store = PgStore::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        store.migrate().await.context("failed to run migrations")?;
        tracing::info!("Using PostgreSQL store");
        AppState::postgres(config, Arc::new(store))?
    } else {
        tracing::warn!("DATABASE_URL not set, using in-memory store");
        AppState::in_memory(config)?
    };

    // Create router
    let state = Arc::new(state);
    let app = create_router(state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Roastery API Server starting on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("HTTP server exited unexpectedly")?;

    Ok(())
}

/// Wait for Ctrl-C, then report not ready while in-flight requests drain
async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    state.set_ready(false);
    tracing::info!("Shutdown requested, draining connections");
}
