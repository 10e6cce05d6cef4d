//! Provlog Server - Standalone entry point for the ledger API.

use anyhow::Result;
use axum::middleware;
use std::sync::Arc;

use provlog_api::middleware::{
    api_key_middleware, body_limit_layer, cors_layer, timeout_layer, tracing_middleware,
};
use provlog_api::{api_router, AppState, Config};
use provlog_archive::{ArchiveBackend, FileArchive};
use provlog_persist::SqliteEventStore;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env();
    tracing::info!(addr = %config.addr, archive = %config.archive_path, "starting provlog server");

    let store = SqliteEventStore::connect(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("store init failed: {}", e))?;

    let archive = FileArchive::new(&config.archive_path);
    if !archive.check_health().await {
        tracing::warn!(path = %config.archive_path, "archive root is not writable at startup");
    }

    let cors = cors_layer(&config.cors_allow_origins);
    let request_timeout = config.request_timeout;
    let max_body_size = config.max_body_size;
    let addr = config.addr;

    let state = AppState::new(config, Arc::new(store), Arc::new(archive));

    let app = api_router(state.clone())
        .layer(body_limit_layer(max_body_size))
        .layer(timeout_layer(request_timeout))
        .layer(cors)
        .layer(middleware::from_fn(tracing_middleware))
        .layer(middleware::from_fn_with_state(state, api_key_middleware));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("provlog API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,provlog_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
