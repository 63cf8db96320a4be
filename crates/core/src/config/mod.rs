//! Service-level configuration for the coordination primitives
//!
//! Settings are plain serde structs so they can live in the host service's
//! TOML or JSON config file. Durations are written as whole seconds:
//!
//! ```toml
//! [cache]
//! ttl_secs = 3600
//! reap_interval_secs = 60
//! size_warning_threshold = 50000
//! name = "repo_metadata"
//! ```
//!
//! See [`loader`] for reading files and applying environment overrides.

pub mod loader;

use std::time::Duration;

use repocoord_common::duration_secs;
use serde::{Deserialize, Serialize};

use crate::cache::ExpiringCacheConfig;
use crate::error::CoreResult;

pub use loader::{load, load_from_env, load_from_file};

/// Root configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    /// Settings for the expiring cache
    pub cache: CacheSettings,
}

/// Serializable form of [`ExpiringCacheConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Idle time after which an entry may be reaped
    #[serde(rename = "ttl_secs", with = "duration_secs")]
    pub ttl: Duration,

    /// Time between reap cycles
    #[serde(rename = "reap_interval_secs", with = "duration_secs")]
    pub reap_interval: Duration,

    /// Entry count above which misses log a warning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_warning_threshold: Option<usize>,

    /// Label attached to log events
    pub name: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = ExpiringCacheConfig::default();
        Self {
            ttl: defaults.ttl,
            reap_interval: defaults.reap_interval,
            size_warning_threshold: defaults.size_warning_threshold,
            name: defaults.name,
        }
    }
}

impl CacheSettings {
    /// Convert into a validated cache configuration.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfig`](crate::CoreError::InvalidConfig)
    /// for a zero duration or a blank name.
    pub fn to_cache_config(&self) -> CoreResult<ExpiringCacheConfig> {
        let config = ExpiringCacheConfig {
            reap_interval: self.reap_interval,
            ttl: self.ttl,
            size_warning_threshold: self.size_warning_threshold,
            name: self.name.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
