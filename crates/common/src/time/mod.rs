//! Time abstraction for deterministic coordination logic
//!
//! Everything in repocoord that reasons about elapsed time (cache TTLs in
//! particular) reads the current instant through a [`Clock`]. Production code
//! uses [`SystemClock`]; tests inject a [`MockClock`] and move time forward by
//! hand.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use repocoord_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(90 * 60));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5400));
//! ```

mod clock;

pub use clock::{Clock, MockClock, SystemClock};
