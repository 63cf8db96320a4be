//! Configuration loader
//!
//! Reads a [`CoordinationConfig`] from a TOML or JSON file and lets
//! environment variables override individual cache settings.
//!
//! ## Environment Variables
//! - `REPOCOORD_CACHE_TTL_SECS`: idle TTL in seconds
//! - `REPOCOORD_CACHE_REAP_INTERVAL_SECS`: time between reap cycles in seconds
//! - `REPOCOORD_CACHE_SIZE_WARNING_THRESHOLD`: entry count that triggers a
//!   warning (`0` or empty disables it)
//! - `REPOCOORD_CACHE_NAME`: label for log events

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use repocoord_common::CommonError;

use super::CoordinationConfig;
use crate::error::CoreResult;

/// Overrides [`CacheSettings::ttl`](super::CacheSettings::ttl), in seconds
pub const ENV_CACHE_TTL_SECS: &str = "REPOCOORD_CACHE_TTL_SECS";
/// Overrides the reap interval, in seconds
pub const ENV_CACHE_REAP_INTERVAL_SECS: &str = "REPOCOORD_CACHE_REAP_INTERVAL_SECS";
/// Overrides the size warning threshold (`0` or empty disables it)
pub const ENV_CACHE_SIZE_WARNING_THRESHOLD: &str = "REPOCOORD_CACHE_SIZE_WARNING_THRESHOLD";
/// Overrides the cache name used in log events
pub const ENV_CACHE_NAME: &str = "REPOCOORD_CACHE_NAME";

/// Load configuration from an optional file, then apply environment
/// overrides.
///
/// Without a file every setting starts from its default.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, an environment
/// variable holds an invalid number, or the resulting cache settings fail
/// validation.
pub fn load(path: Option<&Path>) -> CoreResult<CoordinationConfig> {
    let base = match path {
        Some(path) => load_from_file(path)?,
        None => CoordinationConfig::default(),
    };

    let config = apply_env_overrides(base, |key| std::env::var(key).ok())?;
    config.cache.to_cache_config()?;

    tracing::info!(
        cache = %config.cache.name,
        ttl_secs = config.cache.ttl.as_secs(),
        reap_interval_secs = config.cache.reap_interval.as_secs(),
        "coordination_config.loaded"
    );
    Ok(config)
}

/// Load configuration from defaults plus environment variables only.
///
/// # Errors
/// Returns an error if a variable holds an invalid number.
pub fn load_from_env() -> CoreResult<CoordinationConfig> {
    apply_env_overrides(CoordinationConfig::default(), |key| std::env::var(key).ok())
}

/// Load configuration from a file.
///
/// The format is chosen by extension: `.toml` or `.json`.
///
/// # Errors
/// Returns [`CommonError::Persistence`] if the file cannot be read and
/// [`CommonError::Serialization`] or [`CommonError::Config`] if its contents
/// are invalid.
pub fn load_from_file(path: &Path) -> CoreResult<CoordinationConfig> {
    tracing::debug!(path = %path.display(), "coordination_config.reading_file");

    let contents = std::fs::read_to_string(path).map_err(|err| {
        CommonError::persistence_op("read_config", format!("{}: {err}", path.display()))
    })?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> CoreResult<CoordinationConfig> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();

    let config: CoordinationConfig = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|err| CommonError::serialization_format("TOML", err.to_string()))?,
        "json" => serde_json::from_str(contents)
            .map_err(|err| CommonError::serialization_format("JSON", err.to_string()))?,
        other => {
            return Err(CommonError::config(format!(
                "unsupported config format '{other}' for {}",
                path.display()
            ))
            .into())
        }
    };
    Ok(config)
}

/// Apply overrides read through `lookup` on top of `config`.
///
/// Unset variables leave the corresponding setting untouched.
///
/// # Errors
/// Returns [`CommonError::Config`] naming the variable when a numeric value
/// does not parse.
pub fn apply_env_overrides<F>(
    mut config: CoordinationConfig,
    lookup: F,
) -> CoreResult<CoordinationConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let cache = &mut config.cache;

    if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_TTL_SECS)? {
        cache.ttl = Duration::from_secs(secs);
    }
    if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_CACHE_REAP_INTERVAL_SECS)? {
        cache.reap_interval = Duration::from_secs(secs);
    }
    if let Some(raw) = lookup(ENV_CACHE_SIZE_WARNING_THRESHOLD) {
        cache.size_warning_threshold = match raw.trim() {
            "" | "0" => None,
            value => Some(parse_value(ENV_CACHE_SIZE_WARNING_THRESHOLD, value)?),
        };
    }
    if let Some(name) = lookup(ENV_CACHE_NAME) {
        cache.name = name;
    }

    Ok(config)
}

fn parse_var<T, F>(lookup: &F, key: &str) -> CoreResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|raw| parse_value(key, raw.trim())).transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> CoreResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|err| CommonError::config_field(key, format!("invalid value '{raw}': {err}")).into())
}
