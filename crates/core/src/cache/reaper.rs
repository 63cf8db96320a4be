//! Background expiry task
//!
//! The reaper is a Tokio task that wakes up every `reap_interval` and runs
//! one reap cycle on the blocking pool, so eviction callbacks never stall a
//! runtime worker. It holds the cache weakly: once every handle is dropped the
//! task exits on its next tick even if `shutdown` was never called.

use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use repocoord_common::Clock;
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::core::{CacheShared, ExpiringCache};
use crate::error::{CoreError, CoreResult};

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    /// Start reaping expired entries in the background.
    ///
    /// Only the first call spawns the task; later calls return `Ok(())`.
    /// After [`shutdown`](Self::shutdown) this is a no-op.
    ///
    /// # Errors
    /// Returns [`CoreError::NoRuntime`] when called outside a Tokio runtime.
    pub fn start_reaper(&self) -> CoreResult<()> {
        let shared = &self.shared;
        let mut slot = shared.reaper.lock();

        if slot.is_some() {
            return Ok(());
        }
        if shared.cancellation.is_cancelled() {
            warn!(cache = %shared.config.name, "expiring_cache.reaper_start_after_shutdown");
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| CoreError::NoRuntime)?;
        let period = shared.config.reap_interval;
        let span = info_span!("expiring_cache.reaper", cache = %shared.config.name);
        let task = run_reaper(Arc::downgrade(shared), shared.cancellation.clone(), period);

        *slot = Some(runtime.spawn(task.instrument(span)));
        info!(
            cache = %shared.config.name,
            reap_interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            ttl_ms = u64::try_from(shared.config.ttl.as_millis()).unwrap_or(u64::MAX),
            "expiring_cache.reaper_started"
        );
        Ok(())
    }

    /// Stop the reaper. Safe to call repeatedly.
    ///
    /// Lookups keep working afterwards; entries simply stop expiring.
    pub fn shutdown(&self) {
        let shared = &self.shared;
        if !shared.cancellation.is_cancelled() {
            shared.cancellation.cancel();
            info!(cache = %shared.config.name, "expiring_cache.shutdown");
        }
    }

    /// Whether a reaper task has been spawned and is still running.
    pub fn is_reaper_running(&self) -> bool {
        self.shared.reaper.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the reaper task to exit.
    ///
    /// Call after [`shutdown`](Self::shutdown); otherwise this waits until
    /// every other handle of the cache has been dropped.
    pub async fn join_reaper(&self) {
        let handle = self.shared.reaper.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(cache = %self.shared.config.name, error = %err, "expiring_cache.reaper_join_failed");
            }
        }
    }
}

async fn run_reaper<K, V, C>(
    cache: Weak<CacheShared<K, V, C>>,
    cancellation: CancellationToken,
    period: Duration,
) where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    // The first tick of a plain `interval` fires immediately; skip it.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            () = cancellation.cancelled() => {
                debug!("expiring_cache.reaper_cancelled");
                break;
            }
            _ = ticker.tick() => {
                let Some(shared) = cache.upgrade() else {
                    debug!("expiring_cache.reaper_orphaned");
                    break;
                };
                if let Err(err) = tokio::task::spawn_blocking(move || shared.reap()).await {
                    error!(error = %err, "expiring_cache.reap_failed");
                }
            }
        }
    }

    info!("expiring_cache.reaper_stopped");
}
