//! Fetch-Through Module
//!
//! Cache-aside lookups: answer from the cache, otherwise download from the
//! backing store and populate the cache with the verified result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::ObjectStore;
use crate::cache::{CacheStats, CacheStore};
use crate::error::Result;

/// Backend traffic counters.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct FetchStats {
    /// Calls made to the backing store
    pub backend_fetches: u64,
    /// Calls that ended in an error (not-found included)
    pub backend_failures: u64,
}

// == Fetch Through ==
/// Read-through front for a single bucket.
pub struct FetchThrough {
    cache: Arc<CacheStore>,
    backend: Arc<dyn ObjectStore>,
    bucket: String,
    backend_fetches: AtomicU64,
    backend_failures: AtomicU64,
}

impl FetchThrough {
    pub fn new(cache: Arc<CacheStore>, backend: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            cache,
            backend,
            bucket: bucket.into(),
            backend_fetches: AtomicU64::new(0),
            backend_failures: AtomicU64::new(0),
        }
    }

    // == Fetch ==
    /// Returns the content of `key`, from cache when possible.
    ///
    /// On a miss the backing store is called exactly once and no cache lock
    /// is held during that call. Errors are never cached.
    pub async fn fetch(&self, key: &str) -> Result<Bytes> {
        if let Some(value) = self.cache.get(key) {
            debug!(key = %key, "File found in cache");
            return Ok(value);
        }
        debug!(key = %key, "File not found in cache");

        self.backend_fetches.fetch_add(1, Ordering::Relaxed);
        match self.backend.get_object(&self.bucket, key).await {
            Ok(value) => {
                info!(key = %key, size = value.len(), "Fetched file from backend");
                self.cache.set(key, value.clone());
                Ok(value)
            }
            Err(e) => {
                self.backend_failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, bucket = %self.bucket, error = %e, "Backend fetch failed");
                Err(e.into())
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn fetch_stats(&self) -> FetchStats {
        FetchStats {
            backend_fetches: self.backend_fetches.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
        }
    }
}
