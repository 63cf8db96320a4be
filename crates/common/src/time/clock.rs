//! Clock trait plus the system and mock implementations.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of the current monotonic instant.
///
/// Implementations must be cheap to call; caches read the clock on every
/// hit.
pub trait Clock: Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock implementation backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Manually driven clock for tests.
///
/// Starts at the real instant it was created and only moves when
/// [`advance`](Self::advance) or [`set_elapsed`](Self::set_elapsed) is called.
/// Clones share the same elapsed time, so a test can keep one handle and give
/// another to the component under test.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use repocoord_common::time::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// let observer = clock.clone();
/// let start = observer.now();
///
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(observer.now().duration_since(start), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a clock frozen at the current real instant.
    #[must_use]
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock();
        *elapsed += duration;
    }

    /// Set the total elapsed time since creation.
    ///
    /// Setting a smaller value than the current one moves the clock
    /// backwards, which is occasionally useful for exercising clock skew.
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock() = duration;
    }

    /// Total simulated time since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }
}
