//! Blob Proxy - A read-through cache in front of a MinIO / S3 bucket
//!
//! Serves files from an in-memory cache with sliding TTL expiration and
//! falls back to the object store on a miss.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blob_proxy::api::create_router;
use blob_proxy::backend::MinioStore;
use blob_proxy::cache::CacheStore;
use blob_proxy::{spawn_sweeper, AppState, Config, FetchThrough, SweeperHandle};

/// Main entry point for the blob proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load `.env` and configuration from environment variables
/// 3. Create the cache store and start the TTL sweeper
/// 4. Build the object store client
/// 5. Create Axum router with all endpoints
/// 6. Serve until SIGINT/SIGTERM, then shut down within the configured grace
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blob_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Blob Proxy");

    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            warn!(error = %e, "Failed to load .env file");
        }
    }

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_ttl={}s, sweep_interval={}s, port={}, endpoint={}, bucket={}",
        config.cache_ttl,
        config.sweep_interval,
        config.server_port,
        config.minio.endpoint,
        config.minio.bucket
    );

    let cache = Arc::new(CacheStore::new());
    let sweeper = Arc::new(spawn_sweeper(cache.clone(), config.sweep_config()));
    info!("TTL sweeper started");

    let backend = MinioStore::new(&config.minio).context("failed to build object store client")?;
    let fetcher = FetchThrough::new(cache, Arc::new(backend), config.minio.bucket.clone());

    let app = create_router(AppState::new(fetcher, sweeper.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    let grace = config.shutdown_grace();
    let shutdown_started = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweeper, grace, shutdown_started.clone()))
        .into_future();

    tokio::select! {
        result = server => result.context("server error")?,
        _ = drain_deadline(shutdown_started, grace) => {
            warn!("Open connections did not drain within {}s, exiting", grace.as_secs());
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves `grace` after shutdown has started.
async fn drain_deadline(shutdown_started: Arc<Notify>, grace: Duration) {
    shutdown_started.notified().await;
    tokio::time::sleep(grace).await;
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, stops the sweeper before the server starts draining.
async fn shutdown_signal(sweeper: Arc<SweeperHandle>, grace: Duration, shutdown_started: Arc<Notify>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    shutdown_started.notify_one();

    if !sweeper.shutdown(grace.min(Duration::from_secs(1))).await {
        warn!("TTL sweeper aborted");
    }
}
