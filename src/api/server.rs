use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::{
    services::{domain_stats, get_job, health, index, job_stats, list_jobs},
    state::AppState,
};
use crate::cache::RedisCache;
use crate::config::Config;
use crate::store::PgJobStore;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Routes of the status API with tracing and CORS applied
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/status", get(list_jobs))
        .route("/status/stats", get(job_stats))
        .route("/status/domains", get(domain_stats))
        .route("/status/{id}", get(get_job))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or_else(|| config.server.bind_addr());

    // Neither backend is contacted until the first request needs it
    let store = Arc::new(
        PgJobStore::connect_lazy(&config.database)
            .map_err(|e| format!("Failed to configure queue database: {}", e))?,
    );
    let cache = Arc::new(
        RedisCache::new(&config.cache.url)
            .map_err(|e| format!("Failed to configure cache client: {}", e))?,
    );

    let state = AppState::new(config, store.clone(), cache.clone());
    let metrics = state.metrics.clone();
    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "queuewatch listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache.shutdown().await;
    store.close().await;

    let snapshot = metrics.snapshot();
    info!(
        requests_served = snapshot.requests_served,
        requests_failed = snapshot.requests_failed,
        cache_degraded = snapshot.cache_degraded,
        cache_scan_failed = snapshot.cache_scan_failed,
        "Server stopped"
    );

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
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
