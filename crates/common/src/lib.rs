//! Shared building blocks for the repocoord crates.
//!
//! - [`time`]: injectable [`Clock`] with a wall-clock and a mock implementation
//! - [`error`]: the [`CommonError`] taxonomy and [`ErrorClassification`]
//! - [`utils`]: serde helpers for duration fields in configuration files
//! - `testing` (feature `test-utils`): tracing setup for test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod error;
pub mod time;
pub mod utils;

#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
pub use time::{Clock, MockClock, SystemClock};
pub use utils::serde::duration_secs;
