//! Memoizing cache with background expiry
//!
//! [`ExpiringCache`] computes missing values with a factory supplied at
//! construction time, remembers when each entry was last read, and lets a
//! background reaper drop entries that have been idle for longer than the
//! configured TTL.
//!
//! # Features
//!
//! - **Single computation per key**: concurrent misses for the same key run
//!   the factory once (double-checked locking)
//! - **Lock-free recency**: cache hits bump an atomic timestamp under a shared
//!   read lock
//! - **Eviction callback**: called once per reaped entry, outside every lock
//! - **Size warning**: a `warn!` event when the entry count passes a threshold
//! - **Testable**: TTL arithmetic reads an injected [`Clock`](repocoord_common::Clock)
//!
//! # Trade-off
//!
//! The factory runs while the map's write lock is held. Misses for
//! *different* keys are therefore serialized as well, and a slow factory
//! blocks every other miss (hits that only need the read lock block too while
//! it runs). Keep factories fast or return cheap handles (`Arc<T>`) to data
//! that is loaded elsewhere.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use repocoord_core::ExpiringCache;
//!
//! # fn main() -> repocoord_core::CoreResult<()> {
//! let cache = ExpiringCache::builder(|repo: &String| repo.len())
//!     .ttl(Duration::from_secs(3600))
//!     .reap_interval(Duration::from_secs(60))
//!     .name("repo_name_lengths")
//!     .build()?;
//!
//! assert_eq!(cache.get(&"github.com/org/repo".to_string()), 19);
//! # Ok(())
//! # }
//! ```
//!
//! Inside a Tokio runtime, call [`ExpiringCache::start_reaper`] once at
//! service startup and [`ExpiringCache::shutdown`] at teardown.

mod builder;
mod config;
mod core;
mod reaper;
mod stats;

pub use builder::ExpiringCacheBuilder;
pub use config::{
    ExpiringCacheConfig, ExpiringCacheConfigBuilder, DEFAULT_CACHE_NAME, DEFAULT_REAP_INTERVAL,
    DEFAULT_TTL,
};
pub use self::core::{EvictionCallback, ExpiringCache, Factory};
pub use stats::CacheStats;
