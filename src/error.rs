//! Error types for the cache proxy
//!
//! Provides unified error handling using thiserror. Cache lookups never fail
//! (a miss is `None`), so every variant here originates either at the
//! fetch-through boundary or in the sweeper's control surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::models::ErrorResponse;

// == Proxy Error Enum ==
/// Unified error type for the cache proxy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// The object does not exist in the backing store
    #[error("File not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached or refused the request
    #[error("Backend unavailable: {0}")]
    Backend(String),

    /// The requested file name is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The sweeper has observed shutdown and accepts no more work
    #[error("Shutdown in progress")]
    ShutdownInProgress,
}

impl ProxyError {
    /// True when retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProxyError::Backend(_) | ProxyError::ShutdownInProgress)
    }
}

// == Backend Error Conversion ==
impl From<BackendError> for ProxyError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(key) => ProxyError::NotFound(key),
            BackendError::Transient(msg) => ProxyError::Backend(msg),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::Backend(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::ShutdownInProgress => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
