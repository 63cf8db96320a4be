//! # repocoord core
//!
//! In-process coordination primitives for repository-hosting backends.
//!
//! This crate contains:
//! - [`locker`]: a non-blocking keyed lock table with per-lock status strings,
//!   used to serialize clones and maintenance of a repository directory
//! - [`cache`]: a memoizing cache whose idle entries are reaped in the
//!   background after a TTL
//! - [`config`]: loading cache settings from TOML/JSON files and environment
//!
//! Both primitives are plain owned values. Construct them once at service
//! startup and hand clones of the handle to every consumer; nothing here is a
//! process-wide singleton.

pub mod cache;
pub mod config;
pub mod error;
pub mod locker;

pub use cache::{
    CacheStats, EvictionCallback, ExpiringCache, ExpiringCacheBuilder, ExpiringCacheConfig,
    ExpiringCacheConfigBuilder, Factory,
};
pub use config::{CacheSettings, CoordinationConfig};
pub use error::{CoreError, CoreResult};
pub use locker::{ResourceLock, ResourceLocker};
pub use repocoord_common::{Clock, MockClock, SystemClock};
