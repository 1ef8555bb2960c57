//! Backend Module
//!
//! The object store the proxy reads through to on a cache miss.

mod minio;
mod sigv4;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use minio::MinioStore;
pub use sigv4::Credentials;

// == Backend Error ==
/// Failure classes of the backing store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The object does not exist
    #[error("object not found: {0}")]
    NotFound(String),

    /// Connectivity, authorization or any other failure that may clear up
    #[error("backend request failed: {0}")]
    Transient(String),
}

// == Object Store ==
/// Read access to a bucket-organised blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Downloads the full content of `key` in `bucket`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, BackendError>;
}
