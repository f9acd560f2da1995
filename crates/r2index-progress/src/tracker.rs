//! Signal normalization and throttled reporting for one transfer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use r2index_common::Throttle;

use crate::callback::ProgressCallback;
use crate::reporter::{ProgressReporter, ProgressSnapshot, TracingReporter};

/// How a backend's progress values are to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMode {
    /// Each value is the bytes moved since the previous signal
    Incremental,
    /// Each value is the running total moved so far
    Cumulative,
}

struct ProgressState {
    bytes_transferred: u64,
    /// `None` when logging is disabled.
    throttle: Option<Throttle>,
}

impl ProgressState {
    fn apply(&mut self, mode: SignalMode, value: u64) -> u64 {
        self.bytes_transferred = match mode {
            SignalMode::Incremental => self.bytes_transferred.saturating_add(value),
            // Out-of-order totals from parallel parts must not move the count backwards.
            SignalMode::Cumulative => self.bytes_transferred.max(value),
        };
        self.bytes_transferred
    }
}

/// Progress tracker for one upload or download
///
/// Built per transfer and handed to the transport as an opaque signal sink.
/// Every [`on_signal`](Self::on_signal) updates the cumulative count under a
/// mutex, forwards it to the user callback, and, if the log interval has
/// elapsed, emits one line through the reporter. The tracker is `Sync`;
/// share it with worker threads through an `Arc`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use r2index_progress::{MemoryReporter, ProgressTracker, SignalMode};
///
/// let lines = Arc::new(MemoryReporter::new());
/// let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
///     .with_total(Some(1_048_576))
///     .with_interval(Some(Duration::ZERO))
///     .with_reporter(Arc::clone(&lines));
///
/// tracker.on_signal(524_288);
/// assert_eq!(tracker.bytes_transferred(), 524_288);
/// assert!(lines.lines()[0].contains("50.0%"));
/// ```
pub struct ProgressTracker {
    operation: String,
    mode: SignalMode,
    total_size: Option<u64>,
    interval: Option<Duration>,
    start_time: Instant,
    callback: Option<Arc<dyn ProgressCallback>>,
    reporter: Arc<dyn ProgressReporter>,
    state: Mutex<ProgressState>,
}

impl ProgressTracker {
    /// Create a tracker with no total, no callback and logging disabled
    #[must_use]
    pub fn new(operation: impl Into<String>, mode: SignalMode) -> Self {
        Self {
            operation: operation.into(),
            mode,
            total_size: None,
            interval: None,
            start_time: Instant::now(),
            callback: None,
            reporter: Arc::new(TracingReporter),
            state: Mutex::new(ProgressState {
                bytes_transferred: 0,
                throttle: None,
            }),
        }
    }

    /// Set the known total size (`None` means unknown)
    #[must_use]
    pub fn with_total(mut self, total_size: Option<u64>) -> Self {
        self.total_size = total_size;
        self
    }

    /// Minimum time between progress lines; `None` disables them
    ///
    /// The first window starts when the tracker was created.
    #[must_use]
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        let start = self.start_time;
        self.interval = interval;
        self.state_mut().throttle = interval.map(|interval| Throttle::starting_at(interval, start));
        self
    }

    /// Invoke `callback` with the cumulative count after every signal
    #[must_use]
    pub fn with_callback<C: ProgressCallback + 'static>(self, callback: C) -> Self {
        self.with_shared_callback(Arc::new(callback))
    }

    /// Like [`with_callback`](Self::with_callback) for an already shared callback
    #[must_use]
    pub fn with_shared_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Send progress lines to `reporter` instead of `tracing`
    #[must_use]
    pub fn with_reporter<R: ProgressReporter + 'static>(self, reporter: R) -> Self {
        self.with_shared_reporter(Arc::new(reporter))
    }

    /// Like [`with_reporter`](Self::with_reporter) for an already shared reporter
    #[must_use]
    pub fn with_shared_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Record one backend signal
    ///
    /// Never fails. Signals arriving after [`finish`](Self::finish) are
    /// processed like any other.
    pub fn on_signal(&self, value: u64) {
        let now = Instant::now();
        let (cumulative, log_due) = {
            let mut state = self.lock_state();
            let cumulative = state.apply(self.mode, value);
            let log_due = state
                .throttle
                .as_mut()
                .is_some_and(|throttle| throttle.ready_at(now));
            (cumulative, log_due)
        };

        if let Some(callback) = &self.callback {
            callback.on_bytes(cumulative);
        }

        if log_due {
            self.reporter.report(&self.snapshot_at(cumulative, now));
        }
    }

    /// Emit one final line regardless of throttle timing
    pub fn finish(&self) {
        let now = Instant::now();
        let cumulative = self.lock_state().bytes_transferred;
        self.reporter.report(&self.snapshot_at(cumulative, now));
    }

    /// Cumulative bytes transferred so far
    #[must_use]
    pub fn bytes_transferred(&self) -> u64 {
        self.lock_state().bytes_transferred
    }

    /// Known total size, if any
    #[must_use]
    pub fn total_size(&self) -> Option<u64> {
        self.total_size
    }

    /// Signal interpretation fixed at construction
    #[must_use]
    pub fn mode(&self) -> SignalMode {
        self.mode
    }

    /// Operation label
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Log interval, `None` when logging is disabled
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Current progress as a snapshot
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let cumulative = self.bytes_transferred();
        self.snapshot_at(cumulative, Instant::now())
    }

    fn snapshot_at(&self, bytes_transferred: u64, now: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            operation: self.operation.clone(),
            bytes_transferred,
            total_size: self.total_size,
            elapsed: now.saturating_duration_since(self.start_time),
        }
    }

    // The tracker has no failure modes, so a poisoned lock is simply reused.
    fn lock_state(&self) -> MutexGuard<'_, ProgressState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut ProgressState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("operation", &self.operation)
            .field("mode", &self.mode)
            .field("total_size", &self.total_size)
            .field("interval", &self.interval)
            .field("bytes_transferred", &self.bytes_transferred())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryReporter;
    use std::thread;

    fn recorded() -> (Arc<Mutex<Vec<u64>>>, impl Fn(u64) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |n: u64| sink.lock().unwrap().push(n))
    }

    #[test]
    fn incremental_accumulates() {
        let (seen, cb) = recorded();
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental).with_callback(cb);

        tracker.on_signal(100);
        tracker.on_signal(200);

        assert_eq!(tracker.bytes_transferred(), 300);
        assert_eq!(*seen.lock().unwrap(), vec![100, 300]);
    }

    #[test]
    fn cumulative_replaces() {
        let (seen, cb) = recorded();
        let tracker =
            ProgressTracker::new("Downloading", SignalMode::Cumulative).with_callback(cb);

        tracker.on_signal(100);
        tracker.on_signal(300);

        assert_eq!(tracker.bytes_transferred(), 300);
        assert_eq!(*seen.lock().unwrap(), vec![100, 300]);
    }

    #[test]
    fn cumulative_never_decreases() {
        let tracker = ProgressTracker::new("Downloading", SignalMode::Cumulative);
        tracker.on_signal(500);
        tracker.on_signal(200);
        assert_eq!(tracker.bytes_transferred(), 500);
    }

    #[test]
    fn incremental_saturates() {
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental);
        tracker.on_signal(u64::MAX);
        tracker.on_signal(1);
        assert_eq!(tracker.bytes_transferred(), u64::MAX);
    }

    #[test]
    fn zero_interval_logs_every_signal() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_interval(Some(Duration::ZERO))
            .with_reporter(Arc::clone(&lines));

        for _ in 0..5 {
            tracker.on_signal(10);
        }
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn no_interval_never_logs_signals() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_interval(None)
            .with_reporter(Arc::clone(&lines));

        for _ in 0..100 {
            tracker.on_signal(10);
        }
        assert!(lines.is_empty());
    }

    #[test]
    fn long_interval_throttles_logs_but_not_callback() {
        let (seen, cb) = recorded();
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_interval(Some(Duration::from_secs(3600)))
            .with_callback(cb)
            .with_reporter(Arc::clone(&lines));

        for _ in 0..10 {
            tracker.on_signal(1);
        }
        assert!(lines.is_empty());
        assert_eq!(seen.lock().unwrap().len(), 10);
    }

    #[test]
    fn elapsed_interval_logs_again() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_interval(Some(Duration::from_millis(50)))
            .with_reporter(Arc::clone(&lines));

        tracker.on_signal(1);
        assert!(lines.is_empty());

        thread::sleep(Duration::from_millis(60));
        tracker.on_signal(1);
        tracker.on_signal(1);

        let lines = lines.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Uploading: 2.00 B — "));
    }

    #[test]
    fn shared_reporter_collects_from_several_trackers() {
        let lines = Arc::new(MemoryReporter::new());
        let shared: Arc<dyn ProgressReporter> = lines.clone();

        ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_shared_reporter(Arc::clone(&shared))
            .finish();
        ProgressTracker::new("Downloading", SignalMode::Cumulative)
            .with_shared_reporter(shared)
            .finish();

        let lines = lines.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Uploading: "));
        assert!(lines[1].starts_with("Downloading: "));
    }

    #[test]
    fn finish_emits_exactly_one_line() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Downloading", SignalMode::Cumulative)
            .with_reporter(Arc::clone(&lines));

        tracker.finish();

        let lines = lines.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Downloading: 0.00 B — "));
    }

    #[test]
    fn finish_ignores_throttle() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_total(Some(1000))
            .with_interval(Some(Duration::from_secs(3600)))
            .with_reporter(Arc::clone(&lines));

        tracker.on_signal(1000);
        tracker.finish();

        let lines = lines.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("(100.0%)"));
    }

    #[test]
    fn signal_after_finish_is_processed() {
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_reporter(crate::NullReporter);
        tracker.on_signal(5);
        tracker.finish();
        tracker.on_signal(5);
        assert_eq!(tracker.bytes_transferred(), 10);
    }

    #[test]
    fn half_way_line_contains_percentage() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Downloading", SignalMode::Incremental)
            .with_total(Some(1_048_576))
            .with_interval(Some(Duration::ZERO))
            .with_reporter(Arc::clone(&lines));

        tracker.on_signal(524_288);

        let lines = lines.lines();
        assert!(lines[0].starts_with("Downloading: 512.00 KB / 1.00 MB (50.0%) — "));
        assert!(lines[0].ends_with("/s"));
    }

    #[test]
    fn unknown_total_has_no_percentage() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = ProgressTracker::new("Uploading", SignalMode::Incremental)
            .with_interval(Some(Duration::ZERO))
            .with_reporter(Arc::clone(&lines));

        tracker.on_signal(1024);

        let lines = lines.lines();
        assert!(lines[0].starts_with("Uploading: 1.00 KB — "));
        assert!(!lines[0].contains('%'));
    }

    #[test]
    fn concurrent_incremental_signals_are_not_lost() {
        let tracker = Arc::new(
            ProgressTracker::new("Uploading", SignalMode::Incremental)
                .with_interval(Some(Duration::ZERO))
                .with_reporter(crate::NullReporter),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let t = Arc::clone(&tracker);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        t.on_signal(3);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        // 8 parts × 1000 signals × 3 bytes.
        assert_eq!(tracker.bytes_transferred(), 24_000);
    }

    #[test]
    fn accessors() {
        let tracker = ProgressTracker::new("Downloading", SignalMode::Cumulative)
            .with_total(Some(42))
            .with_interval(Some(Duration::from_secs(10)));
        assert_eq!(tracker.operation(), "Downloading");
        assert_eq!(tracker.mode(), SignalMode::Cumulative);
        assert_eq!(tracker.total_size(), Some(42));
        assert_eq!(tracker.interval(), Some(Duration::from_secs(10)));
        assert_eq!(tracker.snapshot().bytes_transferred, 0);
    }
}
