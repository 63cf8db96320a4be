//! Serialization utilities for configuration types
//!
//! Durations in repocoord configuration files are whole seconds: cache TTLs
//! and reap intervals are measured in minutes, so sub-second precision only
//! invites typos.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a `Duration` as whole seconds (`u64`).
///
/// # Usage
/// ```rust
/// use std::time::Duration;
///
/// use repocoord_common::duration_secs;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "duration_secs")]
///     ttl: Duration,
/// }
///
/// let parsed: Example = serde_json::from_str(r#"{"ttl":600}"#).unwrap();
/// assert_eq!(parsed.ttl, Duration::from_secs(600));
/// ```
pub mod duration_secs {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    /// Serde serialization result type
    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize a Duration as seconds, truncating sub-second precision
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize seconds (u64) into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
