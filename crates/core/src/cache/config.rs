//! Expiring cache configuration and builder

use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// Default time between reap cycles
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(60);

/// Default idle time after which an entry may be reaped
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Label attached to log events when no name is configured
pub const DEFAULT_CACHE_NAME: &str = "expiring_cache";

/// Tunables for an [`ExpiringCache`](super::ExpiringCache)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiringCacheConfig {
    /// Time between reap cycles
    pub reap_interval: Duration,

    /// Idle time after which an entry is eligible for reaping
    pub ttl: Duration,

    /// Log a warning whenever a miss grows the cache past this many entries
    /// (None = disabled)
    pub size_warning_threshold: Option<usize>,

    /// Label attached to every log event of the cache
    pub name: String,
}

impl Default for ExpiringCacheConfig {
    fn default() -> Self {
        Self {
            reap_interval: DEFAULT_REAP_INTERVAL,
            ttl: DEFAULT_TTL,
            size_warning_threshold: None,
            name: DEFAULT_CACHE_NAME.to_string(),
        }
    }
}

impl ExpiringCacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> ExpiringCacheConfigBuilder {
        ExpiringCacheConfigBuilder::default()
    }

    /// Reject settings the reaper cannot run with.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfig`] when the reap interval or TTL is
    /// zero, or the name is blank.
    pub fn validate(&self) -> CoreResult<()> {
        if self.reap_interval.is_zero() {
            return Err(CoreError::invalid_config("reap_interval", "must be greater than zero"));
        }
        if self.ttl.is_zero() {
            return Err(CoreError::invalid_config("ttl", "must be greater than zero"));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::invalid_config("name", "must not be blank"));
        }
        Ok(())
    }
}

/// Builder for `ExpiringCacheConfig` with fluent API
#[derive(Debug, Default)]
pub struct ExpiringCacheConfigBuilder {
    config: ExpiringCacheConfig,
}

impl ExpiringCacheConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time between reap cycles
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.config.reap_interval = interval;
        self
    }

    /// Set the idle TTL
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Warn when the entry count exceeds `threshold`
    pub fn size_warning_threshold(mut self, threshold: usize) -> Self {
        self.config.size_warning_threshold = Some(threshold);
        self
    }

    /// Set the log label
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.name = name.into();
        self
    }

    /// Build the configuration (validated when the cache is built)
    pub fn build(self) -> ExpiringCacheConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::config.
    use super::*;

    /// Validates `ExpiringCacheConfig::default` behavior.
    ///
    /// Assertions:
    /// - Confirms the reap interval is one minute and the TTL ten minutes.
    /// - Ensures the size warning is disabled.
    #[test]
    fn test_default_config() {
        let config = ExpiringCacheConfig::default();

        assert_eq!(config.reap_interval, Duration::from_secs(60));
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert!(config.size_warning_threshold.is_none());
        assert_eq!(config.name, "expiring_cache");
        assert!(config.validate().is_ok());
    }

    /// Validates `ExpiringCacheConfig::builder` behavior.
    ///
    /// Assertions:
    /// - Confirms every builder setter is reflected in the result.
    #[test]
    fn test_builder_sets_fields() {
        let config = ExpiringCacheConfig::builder()
            .reap_interval(Duration::from_secs(5))
            .ttl(Duration::from_secs(3600))
            .size_warning_threshold(10_000)
            .name("inference_results")
            .build();

        assert_eq!(config.reap_interval, Duration::from_secs(5));
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.size_warning_threshold, Some(10_000));
        assert_eq!(config.name, "inference_results");
    }

    /// Validates rejection of zero durations and blank names.
    ///
    /// Assertions:
    /// - Confirms each invalid field is reported by name.
    #[test]
    fn test_validate_rejects_invalid_settings() {
        let zero_interval = ExpiringCacheConfig::builder().reap_interval(Duration::ZERO).build();
        assert!(matches!(
            zero_interval.validate(),
            Err(CoreError::InvalidConfig { field: "reap_interval", .. })
        ));

        let zero_ttl = ExpiringCacheConfig::builder().ttl(Duration::ZERO).build();
        assert!(matches!(zero_ttl.validate(), Err(CoreError::InvalidConfig { field: "ttl", .. })));

        let blank = ExpiringCacheConfig::builder().name("  ").build();
        assert!(matches!(blank.validate(), Err(CoreError::InvalidConfig { field: "name", .. })));
    }
}
