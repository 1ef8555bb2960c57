//! API Module
//!
//! HTTP handlers and routing for the proxy.
//!
//! # Endpoints
//! - `GET /get-file/:file_name` - Fetch a file through the cache
//! - `GET /ping` - Liveness probe
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache and backend statistics
//! - `POST /admin/sweep` - Schedule an immediate expiration sweep

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
