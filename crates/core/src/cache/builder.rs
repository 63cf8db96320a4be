//! Fluent construction of an [`ExpiringCache`]

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use repocoord_common::{Clock, SystemClock};

use super::config::ExpiringCacheConfig;
use super::core::{EvictionCallback, ExpiringCache, Factory};
use crate::error::CoreResult;

/// Builder returned by [`ExpiringCache::builder`].
///
/// Settings default to [`ExpiringCacheConfig::default`], a no-op eviction
/// callback, and the system clock.
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use repocoord_core::{ExpiringCache, MockClock};
///
/// # fn main() -> repocoord_core::CoreResult<()> {
/// let clock = MockClock::new();
/// let cache = ExpiringCache::builder(|key: &u64| key.to_string())
///     .ttl(Duration::from_secs(3600))
///     .size_warning_threshold(50_000)
///     .on_evict(|key, _value| tracing::debug!(key, "evicted"))
///     .clock(clock.clone())
///     .build()?;
///
/// assert_eq!(cache.get(&7), "7");
/// # Ok(())
/// # }
/// ```
pub struct ExpiringCacheBuilder<K, V, C = SystemClock> {
    config: ExpiringCacheConfig,
    factory: Factory<K, V>,
    on_evict: Option<EvictionCallback<K, V>>,
    clock: C,
}

impl<K, V> ExpiringCacheBuilder<K, V, SystemClock> {
    pub(super) fn new(factory: Factory<K, V>) -> Self {
        Self { config: ExpiringCacheConfig::default(), factory, on_evict: None, clock: SystemClock }
    }
}

impl<K, V, C> ExpiringCacheBuilder<K, V, C>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    /// Replace all settings at once
    #[must_use]
    pub fn config(mut self, config: ExpiringCacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the time between reap cycles
    #[must_use]
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.config.reap_interval = interval;
        self
    }

    /// Set the idle TTL
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Warn when a miss grows the cache past `threshold` entries
    #[must_use]
    pub fn size_warning_threshold(mut self, threshold: usize) -> Self {
        self.config.size_warning_threshold = Some(threshold);
        self
    }

    /// Set the label attached to log events
    #[must_use]
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.name = name.into();
        self
    }

    /// Call `callback` once for every entry a reap cycle removes
    #[must_use]
    pub fn on_evict<F>(mut self, callback: F) -> Self
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        self.on_evict = Some(Arc::new(callback));
        self
    }

    /// Read time from `clock` instead of the system clock
    #[must_use]
    pub fn clock<C2: Clock>(self, clock: C2) -> ExpiringCacheBuilder<K, V, C2> {
        ExpiringCacheBuilder {
            config: self.config,
            factory: self.factory,
            on_evict: self.on_evict,
            clock,
        }
    }

    /// Validate the settings and create the cache.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfig`](crate::CoreError::InvalidConfig)
    /// when the configuration is rejected by
    /// [`ExpiringCacheConfig::validate`].
    pub fn build(self) -> CoreResult<ExpiringCache<K, V, C>> {
        self.config.validate()?;
        Ok(ExpiringCache::from_parts(self.config, self.clock, self.factory, self.on_evict))
    }
}
