//! Testing utilities
//!
//! Enabled with the `test-utils` feature so downstream crates can share the
//! same tracing setup in their integration tests.
//!
//! ```rust
//! use repocoord_common::testing::{init_test_tracing, MockClock};
//!
//! init_test_tracing();
//! let clock = MockClock::new();
//! clock.advance(std::time::Duration::from_secs(5));
//! ```

use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub use crate::time::{Clock, MockClock, SystemClock};

static INIT: Once = Once::new();

/// Install a test-friendly `tracing` subscriber once per process.
///
/// Honors `RUST_LOG` and defaults to `debug` for the repocoord crates. Output
/// goes through the test writer so it is captured unless `--nocapture` is
/// passed.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("repocoord_common=debug,repocoord_core=debug"));

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing helpers.
    use super::*;

    /// Validates that repeated initialization is harmless.
    #[test]
    fn test_init_test_tracing_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
        tracing::debug!(target: "repocoord_common", "tracing initialized twice");
    }
}
