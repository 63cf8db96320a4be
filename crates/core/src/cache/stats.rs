//! Cache statistics and metrics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters of an expiring cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,

    /// Lookups answered from the cache
    pub hits: u64,

    /// Lookups that had to run the factory (including failed attempts)
    pub misses: u64,

    /// Entries created by a miss
    pub inserts: u64,

    /// Entries removed by the reaper
    pub evictions: u64,

    /// Completed reap cycles
    pub reap_cycles: u64,
}

impl CacheStats {
    /// Calculate hit rate (hits / total accesses)
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of lookups (hits + misses)
    pub const fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Lock-free counters updated on the cache's hot paths
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    reap_cycles: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reap(&self, evicted: usize) {
        self.reap_cycles.fetch_add(1, Ordering::Relaxed);
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, size: usize) -> CacheStats {
        CacheStats {
            size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            reap_cycles: self.reap_cycles.load(Ordering::Relaxed),
        }
    }
}
