//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::fetch::FetchStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries expired by the sweeper
    pub expirations: u64,
    /// Number of completed sweep passes
    pub sweeps: u64,
    /// Number of calls to the backing store
    pub backend_fetches: u64,
    /// Number of failed backing store calls
    pub backend_failures: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache and backend statistics
    pub fn new(cache: &CacheStats, fetch: &FetchStats) -> Self {
        Self {
            hits: cache.hits,
            misses: cache.misses,
            expirations: cache.expirations,
            sweeps: cache.sweeps,
            backend_fetches: fetch.backend_fetches,
            backend_failures: fetch.backend_failures,
            total_entries: cache.total_entries,
            hit_rate: cache.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for a manual sweep request (POST /admin/sweep)
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    pub message: String,
}

impl SweepResponse {
    pub fn accepted() -> Self {
        Self {
            message: "Sweep scheduled".to_string(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
