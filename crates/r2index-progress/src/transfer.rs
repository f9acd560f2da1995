//! Tracker wiring for upload and download workflows.
//!
//! The transport itself lives elsewhere. These helpers decide whether a
//! transfer needs a tracker at all, pick its label, and resolve the total
//! size: a local `stat` for uploads, a caller-supplied remote probe for
//! downloads. A failed lookup degrades to an unknown total.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::callback::ProgressCallback;
use crate::reporter::ProgressReporter;
use crate::tracker::{ProgressTracker, SignalMode};
use crate::DEFAULT_PROGRESS_INTERVAL;

/// Default size above which a backend should switch to multipart (100 MiB)
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Default multipart part size (100 MiB)
pub const DEFAULT_MULTIPART_CHUNKSIZE: u64 = 100 * 1024 * 1024;

/// Direction of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Local file to object store
    Upload,
    /// Object store to local file
    Download,
}

impl TransferKind {
    /// Operation label used in progress lines
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TransferKind::Upload => "Uploading",
            TransferKind::Download => "Downloading",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferKind::Upload => f.write_str("Upload"),
            TransferKind::Download => f.write_str("Download"),
        }
    }
}

/// Multipart and threading settings handed through to a transfer backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Size threshold (bytes) to trigger multipart transfer
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold: u64,
    /// Size of each part (bytes)
    #[serde(default = "default_multipart_chunksize")]
    pub multipart_chunksize: u64,
    /// Parallel part transfers
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Whether to use worker threads for parts
    #[serde(default = "default_true")]
    pub use_threads: bool,
}

fn default_multipart_threshold() -> u64 {
    DEFAULT_MULTIPART_THRESHOLD
}

fn default_multipart_chunksize() -> u64 {
    DEFAULT_MULTIPART_CHUNKSIZE
}

/// Twice the available parallelism, never below 4
#[must_use]
pub fn default_max_concurrency() -> usize {
    let cpus = std::thread::available_parallelism().map_or(2, std::num::NonZeroUsize::get);
    (cpus * 2).max(4)
}

fn default_true() -> bool {
    true
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
            multipart_chunksize: DEFAULT_MULTIPART_CHUNKSIZE,
            max_concurrency: default_max_concurrency(),
            use_threads: true,
        }
    }
}

impl TransferConfig {
    /// Log the settings a transfer is about to use
    pub fn log(&self, kind: TransferKind) {
        tracing::info!(
            "{} transfer config: threshold={}, chunksize={}, concurrency={}, threads={}",
            kind,
            self.multipart_threshold,
            self.multipart_chunksize,
            self.max_concurrency,
            self.use_threads
        );
    }
}

/// Per-transfer progress settings chosen by the caller
#[derive(Clone)]
pub struct TransferOptions {
    callback: Option<Arc<dyn ProgressCallback>>,
    reporter: Option<Arc<dyn ProgressReporter>>,
    interval: Option<Duration>,
    mode: SignalMode,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            callback: None,
            reporter: None,
            interval: Some(DEFAULT_PROGRESS_INTERVAL),
            mode: SignalMode::Incremental,
        }
    }
}

impl TransferOptions {
    /// Incremental signals, 10 s log interval, no callback
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// User callback receiving the cumulative count on every signal
    #[must_use]
    pub fn with_callback<C: ProgressCallback + 'static>(mut self, callback: C) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Reporter for progress lines (defaults to `tracing`)
    #[must_use]
    pub fn with_reporter<R: ProgressReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Log interval; `None` disables progress lines
    #[must_use]
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval;
        self
    }

    /// Signal shape of the backend in use
    #[must_use]
    pub fn with_mode(mut self, mode: SignalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether a tracker would be built at all
    #[must_use]
    pub fn wants_tracker(&self) -> bool {
        self.callback.is_some() || self.interval.is_some()
    }

    /// Build a tracker for an upload of the local file at `path`
    ///
    /// Returns `None` when neither a callback nor an interval is set. If the
    /// file cannot be inspected the total is left unknown.
    #[must_use]
    pub fn upload_tracker(&self, path: &Path) -> Option<ProgressTracker> {
        if !self.wants_tracker() {
            return None;
        }
        let total = match std::fs::metadata(path) {
            Ok(meta) => Some(meta.len()),
            Err(e) => {
                tracing::debug!("Upload size unknown for {}: {}", path.display(), e);
                None
            }
        };
        Some(self.tracker(TransferKind::Upload, total))
    }

    /// Build a tracker for a download whose size comes from `probe`
    ///
    /// `probe` typically asks the object store for the object's length and
    /// is only called when a tracker is needed. Any probe error is swallowed
    /// and the total is left unknown.
    #[must_use]
    pub fn download_tracker<F, E>(&self, probe: F) -> Option<ProgressTracker>
    where
        F: FnOnce() -> Result<u64, E>,
        E: fmt::Display,
    {
        if !self.wants_tracker() {
            return None;
        }
        let total = match probe() {
            Ok(len) => Some(len),
            Err(e) => {
                tracing::debug!("Download size unknown: {}", e);
                None
            }
        };
        Some(self.tracker(TransferKind::Download, total))
    }

    /// Build a tracker for `kind` with an explicit total
    #[must_use]
    pub fn tracker(&self, kind: TransferKind, total: Option<u64>) -> ProgressTracker {
        let mut tracker = ProgressTracker::new(kind.label(), self.mode)
            .with_total(total)
            .with_interval(self.interval);
        if let Some(callback) = &self.callback {
            tracker = tracker.with_shared_callback(Arc::clone(callback));
        }
        if let Some(reporter) = &self.reporter {
            tracker = tracker.with_shared_reporter(Arc::clone(reporter));
        }
        tracker
    }
}

impl fmt::Debug for TransferOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferOptions")
            .field("callback", &self.callback.is_some())
            .field("reporter", &self.reporter.is_some())
            .field("interval", &self.interval)
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryReporter;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::NamedTempFile;

    #[test]
    fn labels() {
        assert_eq!(TransferKind::Upload.label(), "Uploading");
        assert_eq!(TransferKind::Download.label(), "Downloading");
    }

    #[test]
    fn default_config_values() {
        let config = TransferConfig::default();
        assert_eq!(config.multipart_threshold, 100 * 1024 * 1024);
        assert_eq!(config.multipart_chunksize, 100 * 1024 * 1024);
        assert!(config.max_concurrency >= 4);
        assert_eq!(config.max_concurrency % 2, 0);
        assert!(config.use_threads);
    }

    #[test]
    fn no_tracker_without_callback_or_interval() {
        let options = TransferOptions::new().with_interval(None);
        assert!(!options.wants_tracker());
        assert!(options.upload_tracker(Path::new("/nonexistent")).is_none());

        let probed = AtomicBool::new(false);
        let tracker = options.download_tracker(|| {
            probed.store(true, Ordering::SeqCst);
            Ok::<u64, String>(10)
        });
        assert!(tracker.is_none());
        assert!(!probed.load(Ordering::SeqCst));
    }

    #[test]
    fn callback_alone_builds_tracker() {
        let options = TransferOptions::new()
            .with_interval(None)
            .with_callback(|_: u64| {});
        let tracker = options.tracker(TransferKind::Upload, Some(1));
        assert_eq!(tracker.interval(), None);
        assert_eq!(tracker.operation(), "Uploading");
    }

    #[test]
    fn upload_uses_local_size() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 2048]).unwrap();
        file.flush().unwrap();

        let tracker = TransferOptions::new().upload_tracker(file.path()).unwrap();
        assert_eq!(tracker.total_size(), Some(2048));
        assert_eq!(tracker.interval(), Some(DEFAULT_PROGRESS_INTERVAL));
        assert_eq!(tracker.mode(), SignalMode::Incremental);
    }

    #[test]
    fn upload_of_missing_file_has_unknown_total() {
        let tracker = TransferOptions::new()
            .upload_tracker(Path::new("/definitely/not/here.bin"))
            .unwrap();
        assert_eq!(tracker.total_size(), None);
    }

    #[test]
    fn download_probe_failure_degrades_to_unknown() {
        let lines = Arc::new(MemoryReporter::new());
        let tracker = TransferOptions::new()
            .with_mode(SignalMode::Cumulative)
            .with_interval(Some(Duration::ZERO))
            .with_reporter(Arc::clone(&lines))
            .download_tracker(|| Err::<u64, _>("403 Forbidden"))
            .unwrap();

        assert_eq!(tracker.total_size(), None);
        assert_eq!(tracker.operation(), "Downloading");

        tracker.on_signal(1024);
        assert!(!lines.lines()[0].contains('%'));
    }

    #[test]
    fn download_probe_success_sets_total() {
        let tracker = TransferOptions::new()
            .download_tracker(|| Ok::<_, std::io::Error>(4096))
            .unwrap();
        assert_eq!(tracker.total_size(), Some(4096));
    }

    #[test]
    fn shared_reporter_reaches_every_tracker() {
        let lines = Arc::new(MemoryReporter::new());
        let options = TransferOptions::new()
            .with_interval(None)
            .with_reporter(Arc::clone(&lines));

        options.tracker(TransferKind::Upload, Some(10)).finish();
        options.tracker(TransferKind::Download, None).finish();

        let lines = lines.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Uploading: 0.00 B / 10.00 B (0.0%)"));
        assert!(lines[1].starts_with("Downloading: 0.00 B — "));
    }

    #[test]
    fn shared_callback_reaches_every_tracker() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let options = TransferOptions::new()
            .with_interval(None)
            .with_callback(move |n: u64| sink.lock().unwrap().push(n));

        options.tracker(TransferKind::Upload, None).on_signal(1);
        options.tracker(TransferKind::Download, None).on_signal(2);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
