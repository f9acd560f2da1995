//! # r2index common
//!
//! Small utilities shared by the checksum engine and the progress tracker.
//!
//! This crate provides:
//! - Human-readable byte, rate, percentage and duration formatting
//! - A monotonic interval throttle for rate-limited reporting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod throttle;

pub use format::{bytes_per_second, format_bytes, format_duration, format_percent, format_rate};
pub use throttle::Throttle;
