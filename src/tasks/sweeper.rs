//! TTL Sweeper Task
//!
//! Background task that periodically expires idle cache entries.
//!
//! Expiration is two-phase. A marking pass walks the store under the map read
//! lock, flags idle entries as deleted and pushes them onto a removal queue.
//! Once the pass has finished, the sweeper loop drains that queue, taking the
//! map write lock once per key. The write lock is therefore never held for a
//! whole scan, and never awaited while a scan holds the read lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStore, ExpiredEntry};
use crate::error::{ProxyError, Result};

/// Shortest TTL or interval the sweeper runs with. Shorter values are raised
/// to it.
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(1);

// == Sweep Config ==
/// Timing parameters for the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Idle time after which an entry expires
    pub ttl: Duration,
    /// Time between two sweep ticks
    pub interval: Duration,
}

impl SweepConfig {
    /// Creates a config that sweeps once per TTL.
    pub fn new(ttl: Duration) -> Self {
        let ttl = ttl.max(MIN_SWEEP_PERIOD);
        Self { ttl, interval: ttl }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_SWEEP_PERIOD);
        self
    }
}

// == In-Flight Guard ==
/// Single-flight token for marking passes. Clears the flag on drop.
#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// == Sweeper Handle ==
/// Control surface for a running sweeper.
///
/// Dropping the handle also stops the sweeper, since the loop treats a closed
/// shutdown channel as a shutdown request.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    trigger_tx: mpsc::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SweeperHandle {
    /// Requests an immediate sweep in addition to the regular ticks.
    ///
    /// Requests coalesce: if one is already queued this is a no-op.
    pub fn trigger(&self) -> Result<()> {
        if self.is_shutdown() {
            return Err(ProxyError::ShutdownInProgress);
        }
        match self.trigger_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Closed(())) => Err(ProxyError::ShutdownInProgress),
        }
    }

    /// True once shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Signals shutdown and waits up to `grace` for the sweeper to exit.
    ///
    /// Returns `true` if the task finished cleanly in time. A task that
    /// panicked reports `false`, and one that overran `grace` is aborted.
    /// Calling this more than once is harmless.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.shutdown_tx.send_replace(true);

        let Some(mut task) = self.task.lock().await.take() else {
            return true;
        };

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => {
                info!("TTL sweeper stopped");
                true
            }
            Ok(Err(e)) => {
                error!(error = %e, "TTL sweeper task failed");
                false
            }
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "TTL sweeper did not stop in time, aborting");
                task.abort();
                false
            }
        }
    }
}

enum LoopEvent {
    Sweep,
    PassFinished(std::result::Result<(), JoinError>),
    Removal(ExpiredEntry),
}

/// Resolves when the running pass ends. Pending forever when there is none.
async fn join_pass(pass: &mut Option<JoinHandle<()>>) -> std::result::Result<(), JoinError> {
    match pass {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Spawns the background task that expires idle entries from `store`.
///
/// The first tick fires immediately, then every `config.interval`. Ticks that
/// were missed while the runtime was busy are skipped rather than replayed,
/// and a tick that arrives while a marking pass is still running is dropped.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::new());
/// let sweeper = spawn_sweeper(store.clone(), SweepConfig::new(Duration::from_secs(5)));
/// // Later, during shutdown:
/// sweeper.shutdown(Duration::from_secs(1)).await;
/// ```
pub fn spawn_sweeper(store: Arc<CacheStore>, config: SweepConfig) -> SweeperHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);

    let task = tokio::spawn(async move {
        info!(
            ttl_secs = config.ttl.as_secs_f64(),
            interval_secs = config.interval.as_secs_f64(),
            "Starting TTL sweeper"
        );

        let mut ticker = interval(config.interval.max(MIN_SWEEP_PERIOD));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let (removal_tx, mut removal_rx) = mpsc::unbounded_channel::<ExpiredEntry>();
        let in_flight = Arc::new(AtomicBool::new(false));
        let mut pass: Option<JoinHandle<()>> = None;

        loop {
            // Removals wait until the running pass has released the read lock,
            // so this task never parks a worker thread on the write lock.
            let event = tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
                result = join_pass(&mut pass), if pass.is_some() => LoopEvent::PassFinished(result),
                Some(expired) = removal_rx.recv(), if pass.is_none() => LoopEvent::Removal(expired),
                _ = ticker.tick() => LoopEvent::Sweep,
                Some(()) = trigger_rx.recv() => {
                    debug!("Manual sweep requested");
                    LoopEvent::Sweep
                }
            };

            match event {
                LoopEvent::PassFinished(result) => {
                    pass = None;
                    if let Err(e) = result {
                        error!(error = %e, "Sweep pass failed");
                    }
                }
                LoopEvent::Removal(expired) => {
                    if store.remove_expired(&expired) {
                        debug!(key = %expired.key, "Removed expired entry");
                    }
                }
                LoopEvent::Sweep => {
                    let Some(guard) = InFlightGuard::try_acquire(&in_flight) else {
                        debug!("Previous sweep still running, skipping tick");
                        continue;
                    };

                    let now = Instant::now();
                    let store = Arc::clone(&store);
                    let shutdown = shutdown_rx.clone();
                    let removals = removal_tx.clone();

                    pass = Some(tokio::task::spawn_blocking(move || {
                        let _guard = guard;
                        let summary = store.mark_expired(config.ttl, now, &shutdown, &removals);

                        if summary.cancelled {
                            debug!(examined = summary.examined, "Sweep cancelled");
                        } else if summary.expired > 0 {
                            info!(
                                expired = summary.expired,
                                examined = summary.examined,
                                "TTL sweep: marked {} entries as expired",
                                summary.expired
                            );
                        } else {
                            debug!(examined = summary.examined, "TTL sweep: no expired entries found");
                        }
                    }));
                }
            }
        }

        // No map mutations past this point: drop pending removals.
        drop(removal_rx);

        if let Some(pass) = pass {
            // The pass checks the shutdown flag per entry, so this is short.
            let _ = pass.await;
        }
        debug!("TTL sweeper loop exited");
    });

    SweeperHandle {
        shutdown_tx,
        trigger_tx,
        task: Mutex::new(Some(task)),
    }
}
