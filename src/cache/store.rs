//! Cache Store Module
//!
//! Concurrent key → entry map with two-level locking. The map lock guards the
//! map's shape (insert, replace, remove); every entry carries its own lock for
//! the access timestamp and the deleted flag. Lock order is always map lock
//! first, entry lock second.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
#[cfg(test)]
use parking_lot::RwLockWriteGuard;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, StatsCounters};

// == Expired Entry ==
/// A logically deleted entry waiting for physical removal.
///
/// Carries the entry handle so removal can tell whether the key has been
/// re-populated in the meantime.
#[derive(Debug, Clone)]
pub struct ExpiredEntry {
    pub key: String,
    entry: Arc<CacheEntry>,
}

// == Sweep Summary ==
/// Outcome of one marking pass over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Entries inspected before the pass ended
    pub examined: usize,
    /// Entries transitioned to deleted during this pass
    pub expired: usize,
    /// True when the pass stopped early because shutdown was observed
    pub cancelled: bool,
}

// == Cache Store ==
/// In-memory blob cache with sliding TTL expiration.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    /// Performance statistics
    stats: StatsCounters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty CacheStore.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Retrieves a live value by key and refreshes its access time.
    ///
    /// Returns `None` when the key is absent or its entry has been logically
    /// deleted. Never changes the shape of the map.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<Bytes> {
        // Hold the map lock only long enough to clone the handle.
        let entry = self.entries.read().get(key).cloned();

        match entry.and_then(|entry| entry.read(now)) {
            Some(value) => {
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Installs a fresh entry for `key`, replacing any previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        self.set_at(key.into(), value.into(), Instant::now());
    }

    pub(crate) fn set_at(&self, key: String, value: Bytes, now: Instant) {
        let entry = Arc::new(CacheEntry::new(value, now));
        self.entries.write().insert(key, entry);
    }

    // == Mark Expired ==
    /// Logically deletes every entry idle for at least `ttl` and queues it
    /// for removal.
    ///
    /// Holds the map lock in read mode for the whole pass, so lookups keep
    /// flowing while writers wait. Checks `shutdown` before each entry and
    /// returns early once it reads `true` or once the removal queue is closed.
    pub fn mark_expired(
        &self,
        ttl: Duration,
        now: Instant,
        shutdown: &watch::Receiver<bool>,
        removals: &mpsc::UnboundedSender<ExpiredEntry>,
    ) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let entries = self.entries.read();

        for (key, entry) in entries.iter() {
            if *shutdown.borrow() {
                summary.cancelled = true;
                break;
            }
            summary.examined += 1;

            if !entry.expire_if_idle(ttl, now) {
                continue;
            }
            summary.expired += 1;
            debug!(key = %key, "Cache entry expired");

            let expired = ExpiredEntry {
                key: key.clone(),
                entry: Arc::clone(entry),
            };
            if removals.send(expired).is_err() {
                // Consumer is gone; the sweeper is shutting down.
                summary.cancelled = true;
                break;
            }
        }

        self.stats.record_expirations(summary.expired as u64);
        if !summary.cancelled {
            self.stats.record_sweep();
        }
        summary
    }

    // == Remove Expired ==
    /// Physically removes an expired entry.
    ///
    /// Does nothing if the key has since been replaced by a new entry.
    /// Returns `true` if the slot was removed.
    pub fn remove_expired(&self, expired: &ExpiredEntry) -> bool {
        let mut entries = self.entries.write();
        match entries.get(&expired.key) {
            Some(current) if Arc::ptr_eq(current, &expired.entry) => {
                entries.remove(&expired.key);
                true
            }
            _ => false,
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    // == Length ==
    /// Returns the number of keys physically present, including entries that
    /// are logically deleted but not yet removed.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[cfg(test)]
    pub(crate) fn entry(&self, key: &str) -> Option<Arc<CacheEntry>> {
        self.entries.read().get(key).cloned()
    }

    #[cfg(test)]
    pub(crate) fn write_lock(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<CacheEntry>>> {
        self.entries.write()
    }
}
