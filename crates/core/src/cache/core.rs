//! Core expiring cache implementation

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use repocoord_common::{Clock, SystemClock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::builder::ExpiringCacheBuilder;
use super::config::ExpiringCacheConfig;
use super::stats::{CacheStats, MetricsCollector};

/// Computes the value for a missing key
pub type Factory<K, V> = Arc<dyn Fn(&K) -> V + Send + Sync>;

/// Receives every entry removed by a reap cycle
pub type EvictionCallback<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;

/// Stored value plus its last access time.
///
/// `last_used` is nanoseconds since the cache's clock epoch so that hits can
/// refresh it with a plain atomic store under the shared read lock.
struct CacheEntry<V> {
    last_used: AtomicU64,
    value: V,
}

impl<V> CacheEntry<V> {
    const fn new(value: V, stamp: u64) -> Self {
        Self { last_used: AtomicU64::new(stamp), value }
    }

    fn touch(&self, stamp: u64) {
        self.last_used.store(stamp, Ordering::Release);
    }

    fn last_used(&self) -> u64 {
        self.last_used.load(Ordering::Acquire)
    }
}

/// State shared by every handle of one cache and by its reaper task
pub(super) struct CacheShared<K, V, C> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    factory: Factory<K, V>,
    on_evict: EvictionCallback<K, V>,
    pub(super) config: ExpiringCacheConfig,
    clock: C,
    epoch: Instant,
    ttl_nanos: u64,
    metrics: MetricsCollector,
    pub(super) reaper: Mutex<Option<JoinHandle<()>>>,
    pub(super) cancellation: CancellationToken,
}

impl<K, V, C> CacheShared<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    fn stamp(&self) -> u64 {
        let offset = self.clock.now().saturating_duration_since(self.epoch);
        u64::try_from(offset.as_nanos()).unwrap_or(u64::MAX)
    }

    /// Idle for strictly longer than the TTL as of `now`.
    fn is_expired(&self, entry: &CacheEntry<V>, now: u64) -> bool {
        entry.last_used().saturating_add(self.ttl_nanos) < now
    }

    /// Remove every entry idle past the TTL and hand it to the eviction
    /// callback. Returns the number of evicted entries.
    pub(super) fn reap(&self) -> usize {
        let candidates = {
            let entries = self.entries.read();
            let now = self.stamp();
            entries.values().filter(|entry| self.is_expired(entry, now)).count()
        };

        if candidates == 0 {
            self.metrics.record_reap(0);
            return 0;
        }

        // Hits between the two phases may have refreshed some candidates, so
        // the expired set is recomputed under the write lock.
        let evicted: Vec<(K, V)> = {
            let mut entries = self.entries.write();
            let now = self.stamp();
            let expired: Vec<K> = entries
                .iter()
                .filter(|(_, entry)| self.is_expired(entry, now))
                .map(|(key, _)| key.clone())
                .collect();

            expired
                .into_iter()
                .filter_map(|key| entries.remove(&key).map(|entry| (key, entry.value)))
                .collect()
        };

        let count = evicted.len();
        self.metrics.record_reap(count);
        info!(
            cache = %self.config.name,
            candidates,
            evicted = count,
            "expiring_cache.reaped"
        );

        for (key, value) in evicted {
            (self.on_evict)(key, value);
        }

        count
    }
}

/// Memoizing cache whose idle entries are reaped in the background.
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`; prefer `Arc<T>` for large values)
/// - `C`: Clock used for TTL arithmetic (defaults to `SystemClock`)
///
/// Handles are cheap to clone and share one map, one reaper, and one set of
/// statistics.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// use repocoord_core::ExpiringCache;
///
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// let cache = ExpiringCache::new(move |key: &u32| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     key * 2
/// });
///
/// assert_eq!(cache.get(&21), 42);
/// assert_eq!(cache.get(&21), 42);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct ExpiringCache<K, V, C = SystemClock> {
    pub(super) shared: Arc<CacheShared<K, V, C>>,
}

impl<K, V> ExpiringCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with the default configuration and the system clock.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        Self::from_parts(ExpiringCacheConfig::default(), SystemClock, Arc::new(factory), None)
    }

    /// Start building a cache around `factory`.
    pub fn builder<F>(factory: F) -> ExpiringCacheBuilder<K, V, SystemClock>
    where
        F: Fn(&K) -> V + Send + Sync + 'static,
    {
        ExpiringCacheBuilder::new(Arc::new(factory))
    }
}

impl<K, V, C> ExpiringCache<K, V, C>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    pub(super) fn from_parts(
        config: ExpiringCacheConfig,
        clock: C,
        factory: Factory<K, V>,
        on_evict: Option<EvictionCallback<K, V>>,
    ) -> Self {
        let epoch = clock.now();
        let ttl_nanos = u64::try_from(config.ttl.as_nanos()).unwrap_or(u64::MAX);
        let on_evict = on_evict.unwrap_or_else(|| Arc::new(|_, _| {}));

        Self {
            shared: Arc::new(CacheShared {
                entries: RwLock::new(HashMap::new()),
                factory,
                on_evict,
                config,
                clock,
                epoch,
                ttl_nanos,
                metrics: MetricsCollector::default(),
                reaper: Mutex::new(None),
                cancellation: CancellationToken::new(),
            }),
        }
    }

    /// Return the cached value for `key`, computing it with the factory on a
    /// miss.
    ///
    /// Every call refreshes the entry's last-used time. Concurrent misses for
    /// the same key run the factory once; all callers get the same value.
    ///
    /// The factory must not call `get` on this cache: it runs under the
    /// cache's write lock, which is not reentrant.
    pub fn get(&self, key: &K) -> V {
        match self.try_get_with(key, |key| Ok::<V, Infallible>((self.shared.factory)(key))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`get`](Self::get) but computes a missing value with `init`,
    /// which may fail.
    ///
    /// An error is returned to the caller and nothing is cached, so the next
    /// lookup for the key tries again.
    ///
    /// # Errors
    /// Returns whatever `init` returns when the key is missing and `init`
    /// fails.
    pub fn try_get_with<E, F>(&self, key: &K, init: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<V, E>,
    {
        let shared = &*self.shared;

        {
            let entries = shared.entries.read();
            if let Some(entry) = entries.get(key) {
                entry.touch(shared.stamp());
                shared.metrics.record_hit();
                return Ok(entry.value.clone());
            }
        }

        let mut entries = shared.entries.write();
        // Another caller may have filled the key while we waited for the
        // write lock.
        if let Some(entry) = entries.get(key) {
            entry.touch(shared.stamp());
            shared.metrics.record_hit();
            return Ok(entry.value.clone());
        }

        shared.metrics.record_miss();
        let value = init(key)?;
        entries.insert(key.clone(), CacheEntry::new(value.clone(), shared.stamp()));
        shared.metrics.record_insert();

        let size = entries.len();
        drop(entries);

        debug!(cache = %shared.config.name, size, "expiring_cache.miss_populated");
        if let Some(threshold) = shared.config.size_warning_threshold {
            if size > threshold {
                warn!(
                    cache = %shared.config.name,
                    size,
                    threshold,
                    "expiring_cache.size_threshold_exceeded"
                );
            }
        }

        Ok(value)
    }

    /// Cached value for `key` without computing it or refreshing its
    /// last-used time.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.shared.entries.read().get(key).map(|entry| entry.value.clone())
    }

    /// Whether `key` currently has an entry.
    pub fn contains_key(&self, key: &K) -> bool {
        self.shared.entries.read().contains_key(key)
    }

    /// Drop the entry for `key` without calling the eviction callback.
    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.shared.entries.write().remove(key).map(|entry| entry.value)
    }

    /// Drop every entry without calling the eviction callback.
    pub fn clear(&self) {
        self.shared.entries.write().clear();
    }

    /// Run one reap cycle now and return the number of evicted entries.
    ///
    /// The reaper task calls this on every tick. The eviction callback runs
    /// on the calling thread after all locks have been released.
    pub fn reap(&self) -> usize {
        self.shared.reap()
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.shared.entries.read().len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.shared.metrics.snapshot(self.len())
    }

    /// Configuration the cache was built with.
    pub fn config(&self) -> &ExpiringCacheConfig {
        &self.shared.config
    }
}

impl<K, V, C> Clone for ExpiringCache<K, V, C> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<K, V, C> fmt::Debug for ExpiringCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("config", &self.shared.config)
            .field("entries", &self.shared.entries.read().len())
            .field("reaper_cancelled", &self.shared.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::core.
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use repocoord_common::MockClock;

    use super::*;

    type Evicted = Arc<Mutex<Vec<(String, usize)>>>;

    fn counting_cache(
        clock: &MockClock,
        ttl: Duration,
    ) -> (ExpiringCache<String, usize, MockClock>, Arc<AtomicUsize>, Evicted) {
        let calls = Arc::new(AtomicUsize::new(0));
        let evicted: Evicted = Arc::new(Mutex::new(Vec::new()));

        let counter = Arc::clone(&calls);
        let sink = Arc::clone(&evicted);
        let cache = ExpiringCache::builder(move |key: &String| {
            counter.fetch_add(1, Ordering::SeqCst);
            key.len()
        })
        .ttl(ttl)
        .clock(clock.clone())
        .on_evict(move |key, value| sink.lock().push((key, value)))
        .build()
        .unwrap();

        (cache, calls, evicted)
    }

    /// Validates that a hit does not call the factory again.
    ///
    /// Assertions:
    /// - Confirms the factory runs once for two lookups.
    /// - Confirms the hit/miss counters.
    #[test]
    fn test_get_memoizes() {
        let clock = MockClock::new();
        let (cache, calls, _) = counting_cache(&clock, Duration::from_secs(3600));

        assert_eq!(cache.get(&"hello".to_string()), 5);
        assert_eq!(cache.get(&"hello".to_string()), 5);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.inserts, stats.size), (1, 1, 1, 1));
    }

    /// Validates that reaping an idle entry forces recomputation.
    ///
    /// Assertions:
    /// - Confirms the factory call count goes from 1 to 2.
    /// - Confirms the eviction callback received the entry.
    #[test]
    fn test_reap_evicts_idle_entry() {
        let clock = MockClock::new();
        let (cache, calls, evicted) = counting_cache(&clock, Duration::from_secs(3600));

        cache.get(&"hello".to_string());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(2 * 3600));
        assert_eq!(cache.reap(), 1);
        assert!(cache.is_empty());
        assert_eq!(*evicted.lock(), vec![("hello".to_string(), 5)]);

        cache.get(&"hello".to_string());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Validates that a hit refreshes recency so the entry survives a reap.
    ///
    /// Assertions:
    /// - Confirms `foo`, read at T0+50min, survives a reap at T0+70min.
    /// - Confirms `bar`, last read at T0+5min, is evicted.
    #[test]
    fn test_hit_refreshes_last_used() {
        let clock = MockClock::new();
        let (cache, _, evicted) = counting_cache(&clock, Duration::from_secs(3600));

        cache.get(&"foo".to_string());
        clock.advance(Duration::from_secs(5 * 60));
        cache.get(&"bar".to_string());
        clock.set_elapsed(Duration::from_secs(50 * 60));
        cache.get(&"foo".to_string());

        clock.set_elapsed(Duration::from_secs(70 * 60));
        assert_eq!(cache.reap(), 1);

        assert!(cache.contains_key(&"foo".to_string()));
        assert!(!cache.contains_key(&"bar".to_string()));
        assert_eq!(*evicted.lock(), vec![("bar".to_string(), 3)]);
    }

    /// Validates that an entry idle for exactly the TTL is kept.
    #[test]
    fn test_entry_at_exact_ttl_is_kept() {
        let clock = MockClock::new();
        let (cache, _, _) = counting_cache(&clock, Duration::from_secs(60));

        cache.get(&"edge".to_string());
        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.reap(), 0);

        clock.advance(Duration::from_nanos(1));
        assert_eq!(cache.reap(), 1);
    }

    /// Validates that `peek` neither populates nor refreshes.
    ///
    /// Assertions:
    /// - Confirms `peek` on a cold key returns `None` without a factory call.
    /// - Confirms a peeked entry still expires on schedule.
    #[test]
    fn test_peek_does_not_touch() {
        let clock = MockClock::new();
        let (cache, calls, _) = counting_cache(&clock, Duration::from_secs(60));

        assert_eq!(cache.peek(&"cold".to_string()), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        cache.get(&"warm".to_string());
        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.peek(&"warm".to_string()), Some(4));
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.reap(), 1);
    }

    /// Validates explicit invalidation and clearing.
    ///
    /// Assertions:
    /// - Confirms neither path invokes the eviction callback.
    #[test]
    fn test_invalidate_and_clear_skip_callback() {
        let clock = MockClock::new();
        let (cache, _, evicted) = counting_cache(&clock, Duration::from_secs(60));

        cache.get(&"a".to_string());
        cache.get(&"bb".to_string());

        assert_eq!(cache.invalidate(&"a".to_string()), Some(1));
        assert_eq!(cache.invalidate(&"a".to_string()), None);
        cache.clear();

        assert!(cache.is_empty());
        assert!(evicted.lock().is_empty());
    }

    /// Validates that a failing initializer caches nothing.
    ///
    /// Assertions:
    /// - Confirms the error is returned unchanged.
    /// - Confirms the next call runs its initializer and caches the result.
    #[test]
    fn test_try_get_with_does_not_cache_errors() {
        let clock = MockClock::new();
        let (cache, calls, _) = counting_cache(&clock, Duration::from_secs(60));
        let key = "flaky".to_string();

        let first: Result<usize, &str> = cache.try_get_with(&key, |_| Err("backend unavailable"));
        assert_eq!(first, Err("backend unavailable"));
        assert!(!cache.contains_key(&key));

        let second: Result<usize, &str> = cache.try_get_with(&key, |_| Ok(99));
        assert_eq!(second, Ok(99));
        assert_eq!(cache.get(&key), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Validates single computation under a racing cold start.
    ///
    /// Assertions:
    /// - Confirms the factory runs exactly once across 32 threads.
    /// - Confirms every thread observes the same value.
    #[test]
    fn test_concurrent_misses_compute_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = ExpiringCache::new(move |key: &u64| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Arc::new(format!("value-{key}"))
        });

        let barrier = Arc::new(Barrier::new(32));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let cache = cache.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get(&7)
                })
            })
            .collect();

        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }

    /// Clock that returns queued offsets from `base` once each, then `base`.
    #[derive(Clone)]
    struct ScriptedClock {
        base: Instant,
        script: Arc<Mutex<VecDeque<Duration>>>,
    }

    impl ScriptedClock {
        fn new() -> Self {
            Self { base: Instant::now(), script: Arc::new(Mutex::new(VecDeque::new())) }
        }

        fn then(&self, offset: Duration) {
            self.script.lock().push_back(offset);
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> Instant {
            self.base + self.script.lock().pop_front().unwrap_or(Duration::ZERO)
        }
    }

    /// Validates that the write-phase re-check spares entries that are no
    /// longer expired.
    ///
    /// Assertions:
    /// - Confirms an entry expired in the read-phase scan but fresh at the
    ///   write-phase stamp is kept.
    /// - Ensures the eviction callback never runs.
    #[test]
    fn test_reap_rechecks_under_write_lock() {
        let clock = ScriptedClock::new();
        let evicted: Evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let cache = ExpiringCache::builder(|key: &String| key.len())
            .ttl(Duration::from_secs(3600))
            .clock(clock.clone())
            .on_evict(move |key, value| sink.lock().push((key, value)))
            .build()
            .unwrap();

        cache.get(&"racy".to_string());

        // Read phase sees two hours later, write phase sees the insert time.
        clock.then(Duration::from_secs(2 * 3600));
        assert_eq!(cache.reap(), 0);

        assert!(evicted.lock().is_empty());
        assert!(cache.contains_key(&"racy".to_string()));
        assert_eq!(cache.stats().reap_cycles, 1);
    }

    /// Validates that the cache keeps working with a clock moved backwards.
    #[test]
    fn test_clock_skew_does_not_evict() {
        let clock = MockClock::new();
        clock.set_elapsed(Duration::from_secs(600));
        let (cache, _, _) = counting_cache(&clock, Duration::from_secs(60));

        cache.get(&"skew".to_string());
        clock.set_elapsed(Duration::ZERO);

        assert_eq!(cache.reap(), 0);
        assert_eq!(cache.get(&"skew".to_string()), 4);
    }
}
