//! Request and Response models for the proxy API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! validating requests and serializing HTTP response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{clean_file_name, MAX_FILE_NAME_LENGTH};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse, SweepResponse};
