//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_file_handler, health_handler, ping_handler, stats_handler, sweep_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get-file/:file_name", get(get_file_handler))
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/admin/sweep", post(sweep_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
