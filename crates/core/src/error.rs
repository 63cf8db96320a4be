//! Core error types

use repocoord_common::{CommonError, ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Result alias for fallible core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while setting up lockers and caches.
///
/// Lock contention is deliberately absent: `try_acquire` reports it as `None`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cache setting is out of range
    #[error("Invalid cache configuration for '{field}': {reason}")]
    InvalidConfig {
        /// Name of the offending setting
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The reaper was started outside a Tokio runtime
    #[error("Expiring cache reaper requires a running Tokio runtime")]
    NoRuntime,

    /// Shared failure (configuration loading, I/O, decoding)
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    pub(crate) fn invalid_config<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidConfig { field, reason: reason.into() }
    }
}

impl ErrorClassification for CoreError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidConfig { .. } | Self::NoRuntime => false,
            Self::Common(err) => err.is_retryable(),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidConfig { .. } | Self::NoRuntime => ErrorSeverity::Error,
            Self::Common(err) => err.severity(),
        }
    }
}
