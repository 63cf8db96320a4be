//! Common utility helpers
//!
//! - **[`serde`]**: serialization helpers for configuration types

pub mod serde;

pub use self::serde::duration_secs;
