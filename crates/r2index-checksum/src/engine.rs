//! Single-pass checksum computation over files and streams.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use r2index_common::Throttle;

use crate::error::ChecksumError;
use crate::hasher::MultiHasher;
use crate::{CHUNK_SIZE, ChecksumResult};

/// Receives `(bytes_read, total)` while a known-size input is being hashed
pub trait ChecksumObserver: Send + Sync {
    /// Called at most once per configured interval
    fn on_progress(&self, bytes_read: u64, total: u64);
}

impl<F> ChecksumObserver for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn on_progress(&self, bytes_read: u64, total: u64) {
        self(bytes_read, total);
    }
}

#[derive(Clone)]
struct ProgressHook {
    interval: Duration,
    observer: Arc<dyn ChecksumObserver>,
}

/// Per-call throttled view of a [`ProgressHook`]
struct ProgressEmitter<'a> {
    throttle: Throttle,
    observer: &'a dyn ChecksumObserver,
    total: u64,
}

impl ProgressEmitter<'_> {
    fn after_chunk(&mut self, bytes_read: u64) {
        if self.throttle.ready() {
            self.observer.on_progress(bytes_read, self.total);
        }
    }
}

/// Streaming checksum engine
///
/// Reads its input once, in `chunk_size` pieces, and feeds each piece to
/// all four digests before reading the next. The engine is cheap to clone
/// and holds no resources between calls.
#[derive(Clone)]
pub struct ChecksumEngine {
    chunk_size: usize,
    progress: Option<ProgressHook>,
}

impl ChecksumEngine {
    /// Create an engine with the default 8 MiB read size
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            progress: None,
        }
    }

    /// Use a custom read size (0 selects the default)
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    /// Report read progress to `observer` at most once per `interval`
    ///
    /// Progress is only reported when the total size is known up front.
    #[must_use]
    pub fn with_progress<O>(mut self, interval: Duration, observer: O) -> Self
    where
        O: ChecksumObserver + 'static,
    {
        self.progress = Some(ProgressHook {
            interval,
            observer: Arc::new(observer),
        });
        self
    }

    /// Read size in bytes
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Compute checksums of the file at `path`
    ///
    /// The file handle is closed on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::Open`] if the file cannot be opened and
    /// [`ChecksumError::Read`] if a read fails.
    pub fn compute_from_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ChecksumResult, ChecksumError> {
        let path = path.as_ref();
        let open_err = |source| ChecksumError::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_err)?;
        let total = file.metadata().map_err(open_err)?.len();

        let started = Instant::now();
        let result = self.digest_stream(file, Some(total), Some(path))?;
        tracing::debug!(
            "Computed checksums for {} ({} bytes in {:?})",
            path.display(),
            result.size,
            started.elapsed()
        );
        Ok(result)
    }

    /// Compute checksums of everything `reader` yields until end-of-stream
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::Read`] if a read fails.
    pub fn compute_from_reader<R: Read>(
        &self,
        reader: R,
    ) -> Result<ChecksumResult, ChecksumError> {
        self.digest_stream(reader, None, None)
    }

    /// Like [`compute_from_reader`](Self::compute_from_reader), with a known
    /// total so that progress can be reported.
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::Read`] if a read fails.
    pub fn compute_from_reader_with_total<R: Read>(
        &self,
        reader: R,
        total: u64,
    ) -> Result<ChecksumResult, ChecksumError> {
        self.digest_stream(reader, Some(total), None)
    }

    /// Compute checksums of a file on tokio's blocking pool
    ///
    /// The hashing itself is unchanged; only where it runs differs, so a
    /// cooperative runtime is not stalled by a large file.
    ///
    /// # Errors
    ///
    /// Same as [`compute_from_path`](Self::compute_from_path), plus
    /// [`ChecksumError::Task`] if the worker panics or is cancelled.
    pub async fn compute_from_path_async<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ChecksumResult, ChecksumError> {
        let engine = self.clone();
        let path: PathBuf = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || engine.compute_from_path(&path))
            .await
            .map_err(|e| ChecksumError::Task(e.to_string()))?
    }

    /// Compute checksums of an owned reader on tokio's blocking pool
    ///
    /// # Errors
    ///
    /// Same as [`compute_from_reader`](Self::compute_from_reader), plus
    /// [`ChecksumError::Task`] if the worker panics or is cancelled.
    pub async fn compute_from_reader_async<R>(
        &self,
        reader: R,
    ) -> Result<ChecksumResult, ChecksumError>
    where
        R: Read + Send + 'static,
    {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.compute_from_reader(reader))
            .await
            .map_err(|e| ChecksumError::Task(e.to_string()))?
    }

    fn digest_stream<R: Read>(
        &self,
        mut reader: R,
        total: Option<u64>,
        path: Option<&Path>,
    ) -> Result<ChecksumResult, ChecksumError> {
        let mut hasher = MultiHasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        // No observer or no known total: no throttle bookkeeping at all.
        let mut progress = match (&self.progress, total) {
            (Some(hook), Some(total)) => Some(ProgressEmitter {
                throttle: Throttle::new(hook.interval),
                observer: hook.observer.as_ref(),
                total,
            }),
            _ => None,
        };

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ChecksumError::Read {
                        path: path.map(Path::to_path_buf),
                        source,
                    });
                }
            };

            hasher.update(&buffer[..bytes_read]);

            if let Some(emitter) = progress.as_mut() {
                emitter.after_chunk(hasher.size());
            }
        }

        Ok(hasher.finalize())
    }
}

impl Default for ChecksumEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute checksums of a file with the default engine
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
///
/// # Example
///
/// ```no_run
/// use r2index_checksum::compute_checksums;
///
/// let result = compute_checksums("/path/to/archive.tar")?;
/// println!("sha256 {} ({} bytes)", result.sha256, result.size);
/// # Ok::<(), r2index_checksum::ChecksumError>(())
/// ```
pub fn compute_checksums<P: AsRef<Path>>(path: P) -> Result<ChecksumResult, ChecksumError> {
    ChecksumEngine::new().compute_from_path(path)
}

/// Compute checksums of a reader with the default engine
///
/// # Errors
///
/// Returns an error if a read fails.
pub fn compute_checksums_from_reader<R: Read>(
    reader: R,
) -> Result<ChecksumResult, ChecksumError> {
    ChecksumEngine::new().compute_from_reader(reader)
}

/// Compute checksums of a file on tokio's blocking pool with the default engine
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read, or the worker fails.
pub async fn compute_checksums_async<P: AsRef<Path>>(
    path: P,
) -> Result<ChecksumResult, ChecksumError> {
    ChecksumEngine::new().compute_from_path_async(path).await
}

/// Compute checksums of an in-memory buffer
#[must_use]
pub fn checksum_bytes(data: &[u8]) -> ChecksumResult {
    let mut hasher = MultiHasher::new();
    hasher.update(data);
    hasher.finalize()
}
