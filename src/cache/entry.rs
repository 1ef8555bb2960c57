//! Cache Entry Module
//!
//! Defines a single cached blob together with its liveness metadata.

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;

/// Mutable liveness metadata guarded by the entry's own lock.
#[derive(Debug)]
struct EntryState {
    last_accessed: Instant,
    deleted: bool,
}

// == Cache Entry ==
/// A cached value plus the metadata the sweeper uses to expire it.
///
/// The value is immutable; replacing it means installing a new entry. Only
/// `last_accessed` and the `deleted` flag change after construction, both
/// under the entry's own lock.
#[derive(Debug)]
pub struct CacheEntry {
    value: Bytes,
    state: Mutex<EntryState>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a live entry last accessed at `now`.
    pub fn new(value: Bytes, now: Instant) -> Self {
        Self {
            value,
            state: Mutex::new(EntryState {
                last_accessed: now,
                deleted: false,
            }),
        }
    }

    // == Read ==
    /// Returns the value and refreshes the access time, or `None` once the
    /// entry has been logically deleted.
    pub fn read(&self, now: Instant) -> Option<Bytes> {
        let mut state = self.state.lock();
        if state.deleted {
            return None;
        }
        // Never move backwards, even if a caller's `now` was taken earlier.
        if now > state.last_accessed {
            state.last_accessed = now;
        }
        Some(self.value.clone())
    }

    // == Expire ==
    /// Marks the entry deleted if it has been idle for at least `ttl`.
    ///
    /// Returns `true` only for the call that performs the transition.
    pub fn expire_if_idle(&self, ttl: std::time::Duration, now: Instant) -> bool {
        let mut state = self.state.lock();
        if state.deleted {
            return false;
        }
        if now.saturating_duration_since(state.last_accessed) >= ttl {
            state.deleted = true;
            return true;
        }
        false
    }

    /// Unconditionally marks the entry deleted.
    #[cfg(test)]
    pub(crate) fn mark_deleted(&self) {
        self.state.lock().deleted = true;
    }

    pub fn is_deleted(&self) -> bool {
        self.state.lock().deleted
    }

    pub fn last_accessed(&self) -> Instant {
        self.state.lock().last_accessed
    }
}
