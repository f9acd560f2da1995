//! # r2index progress
//!
//! Progress normalization for long-running uploads and downloads.
//!
//! Transfer backends disagree on what a progress signal means: some report
//! the bytes moved since the previous signal, others the running total. A
//! [`ProgressTracker`] is told which shape to expect at construction
//! ([`SignalMode`]) and presents one monotonically increasing cumulative
//! count to callers.
//!
//! This crate provides:
//! - Signal normalization (incremental or cumulative) behind one mutex
//! - An unthrottled per-signal user callback ([`ProgressCallback`])
//! - Throttled human-readable status lines through an injected
//!   [`ProgressReporter`]
//! - Helpers that wire trackers the way upload/download workflows need

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod callback;
pub mod reporter;
pub mod tracker;
pub mod transfer;

pub use callback::ProgressCallback;
pub use reporter::{MemoryReporter, NullReporter, ProgressReporter, ProgressSnapshot, TracingReporter};
pub use tracker::{ProgressTracker, SignalMode};
pub use transfer::{TransferConfig, TransferKind, TransferOptions};

/// Default minimum interval between progress lines (10 s)
pub const DEFAULT_PROGRESS_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);
