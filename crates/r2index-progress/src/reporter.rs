//! Reporting port for progress lines.
//!
//! The tracker never talks to a global logger directly. It hands a
//! [`ProgressSnapshot`] to whatever [`ProgressReporter`] it was built with;
//! [`TracingReporter`] is the default and forwards to `tracing`.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use r2index_common::{bytes_per_second, format_bytes, format_percent, format_rate};

/// Point-in-time view of one transfer
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Operation label, e.g. "Uploading"
    pub operation: String,
    /// Cumulative bytes transferred
    pub bytes_transferred: u64,
    /// Total size, if known
    pub total_size: Option<u64>,
    /// Time since the tracker was created
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Average throughput since start, zero if no time has elapsed
    #[must_use]
    pub fn rate(&self) -> f64 {
        bytes_per_second(self.bytes_transferred, self.elapsed)
    }

    /// Completion percentage, if the total is known and non-zero
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        self.known_total()
            .map(|total| self.bytes_transferred as f64 / total as f64 * 100.0)
    }

    fn known_total(&self) -> Option<u64> {
        self.total_size.filter(|&total| total > 0)
    }
}

/// Renders `"<Operation>: <transferred> / <total> (<pct>%) — <rate>/s"`, or
/// `"<Operation>: <transferred> — <rate>/s"` when the total is unknown.
impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transferred = format_bytes(self.bytes_transferred);
        let rate = format_rate(self.rate());

        match self.known_total() {
            Some(total) => {
                let pct = format_percent(self.bytes_transferred, total).unwrap_or_default();
                write!(
                    f,
                    "{}: {} / {} ({}) — {}",
                    self.operation,
                    transferred,
                    format_bytes(total),
                    pct,
                    rate
                )
            }
            None => write!(f, "{}: {} — {}", self.operation, transferred, rate),
        }
    }
}

/// Sink for throttled progress lines
pub trait ProgressReporter: Send + Sync {
    /// Emit one progress line
    fn report(&self, snapshot: &ProgressSnapshot);
}

impl<F> ProgressReporter for F
where
    F: Fn(&ProgressSnapshot) + Send + Sync,
{
    fn report(&self, snapshot: &ProgressSnapshot) {
        self(snapshot);
    }
}

impl<T: ProgressReporter + ?Sized> ProgressReporter for Arc<T> {
    fn report(&self, snapshot: &ProgressSnapshot) {
        (**self).report(snapshot);
    }
}

/// Emits lines as `tracing` info events with target `r2index::progress`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, snapshot: &ProgressSnapshot) {
        tracing::info!(target: "r2index::progress", "{snapshot}");
    }
}

/// Discards every line
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _snapshot: &ProgressSnapshot) {}
}

/// Keeps rendered lines in memory
///
/// Useful for tests and for UIs that display the latest status line.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    /// Create an empty reporter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all lines reported so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of lines reported so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been reported
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return all lines
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ProgressReporter for MemoryReporter {
    fn report(&self, snapshot: &ProgressSnapshot) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.to_string());
    }
}
