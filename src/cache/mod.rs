//! Cache Module
//!
//! Provides the in-memory blob cache with sliding TTL expiration.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::{CacheStats, StatsCounters};
pub use store::{CacheStore, ExpiredEntry, SweepSummary};
