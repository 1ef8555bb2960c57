//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::error::Result;
use crate::fetch::FetchThrough;
use crate::models::{clean_file_name, HealthResponse, StatsResponse, SweepResponse};
use crate::tasks::SweeperHandle;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside front for the backing bucket
    pub fetcher: Arc<FetchThrough>,
    /// Control handle of the expiration sweeper
    pub sweeper: Arc<SweeperHandle>,
}

impl AppState {
    pub fn new(fetcher: FetchThrough, sweeper: Arc<SweeperHandle>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            sweeper,
        }
    }
}

/// Handler for GET /get-file/:file_name
///
/// Streams the file as raw bytes, fetching it from the backend on a miss.
pub async fn get_file_handler(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response> {
    let key = clean_file_name(&file_name)?;
    info!(file = %key, "Requested file");

    let body = state.fetcher.fetch(&key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        body,
    )
        .into_response())
}

/// Handler for GET /ping
pub async fn ping_handler() -> &'static str {
    "Pong"
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.fetcher.cache_stats();
    let fetch = state.fetcher.fetch_stats();

    Json(StatsResponse::new(&cache, &fetch))
}

/// Handler for POST /admin/sweep
///
/// Rejected with 503 once the sweeper is shutting down.
pub async fn sweep_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SweepResponse>)> {
    state.sweeper.trigger()?;
    Ok((StatusCode::ACCEPTED, Json(SweepResponse::accepted())))
}
