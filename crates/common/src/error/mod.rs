//! Common error types shared by the repocoord crates
//!
//! Contention on a resource lock is not an error in repocoord: a failed
//! acquisition is an ordinary `None`. Errors are reserved for setup problems
//! such as unreadable or malformed configuration.
//!
//! Crate-specific errors compose with [`CommonError`] instead of duplicating
//! its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, thiserror::Error)]
//! pub enum CoreError {
//!     #[error("invalid cache configuration: {0}")]
//!     InvalidConfig(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Standard result type using `CommonError`
pub type CommonResult<T> = Result<T, CommonError>;

/// Error variants shared across crates
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommonError {
    /// Invalid or missing configuration
    #[error("Configuration error{}: {message}", field_suffix(.field))]
    Config {
        /// Human-readable description
        message: String,
        /// Offending field, when known
        field: Option<String>,
    },

    /// Encoding or decoding failure
    #[error("Serialization error{}: {message}", format_suffix(.format))]
    Serialization {
        /// Human-readable description
        message: String,
        /// Format being processed (`TOML`, `JSON`)
        format: Option<String>,
    },

    /// File system failure
    #[error("Persistence error{}: {message}", operation_suffix(.operation))]
    Persistence {
        /// Human-readable description
        message: String,
        /// Operation that failed
        operation: Option<String>,
    },

    /// Invariant violation that should not occur
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable description
        message: String,
    },
}

fn field_suffix(field: &Option<String>) -> String {
    field.as_ref().map(|f| format!(" in field '{f}'")).unwrap_or_default()
}

fn format_suffix(format: &Option<String>) -> String {
    format.as_ref().map(|f| format!(" ({f})")).unwrap_or_default()
}

fn operation_suffix(operation: &Option<String>) -> String {
    operation.as_ref().map(|op| format!(" during '{op}'")).unwrap_or_default()
}

impl CommonError {
    /// Configuration error without a field
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Configuration error attributed to `field`
    pub fn config_field<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Serialization error for a named format
    pub fn serialization_format<F: Into<String>, S: Into<String>>(format: F, message: S) -> Self {
        Self::Serialization { message: message.into(), format: Some(format.into()) }
    }

    /// Persistence error for a named operation
    pub fn persistence_op<O: Into<String>, S: Into<String>>(operation: O, message: S) -> Self {
        Self::Persistence { message: message.into(), operation: Some(operation.into()) }
    }

    /// Internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }
}

/// Severity levels used for logging and alerting decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Degraded but operational
    Warning,
    /// Failure requiring attention
    Error,
    /// System integrity at risk
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Uniform classification of error values
pub trait ErrorClassification {
    /// Whether retrying the failed operation may succeed
    fn is_retryable(&self) -> bool;

    /// Severity for logging and alerting
    fn severity(&self) -> ErrorSeverity;

    /// Whether the error needs immediate attention
    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Suggested delay before a retry
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Config { .. } | Self::Serialization { .. } | Self::Persistence { .. } => {
                ErrorSeverity::Error
            }
            Self::Internal { .. } => ErrorSeverity::Critical,
        }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization_format("JSON", err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization_format("TOML", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence { message: err.to_string(), operation: None }
    }
}
