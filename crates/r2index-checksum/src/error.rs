//! Error types for checksum computation and sidecar files.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Checksum computation errors
///
/// Partial digest state is always discarded; computations are not resumable.
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// Input could not be opened or inspected
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A read failed mid-stream
    #[error("failed to read {}: {source}", describe(.path))]
    Read {
        /// Path being read, if the input came from the filesystem
        path: Option<PathBuf>,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The blocking worker panicked or was cancelled
    #[error("checksum worker failed: {0}")]
    Task(String),
}

impl ChecksumError {
    /// File the error refers to, when known
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ChecksumError::Open { path, .. } => Some(path),
            ChecksumError::Read { path, .. } => path.as_deref(),
            ChecksumError::Task(_) => None,
        }
    }
}

fn describe(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "stream".to_string(),
    }
}

/// Sidecar file errors
#[derive(Debug, Error)]
pub enum SidecarError {
    /// Reading or writing a sidecar failed
    #[error("sidecar I/O on {}: {source}", .path.display())]
    Io {
        /// Sidecar path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Line does not follow `"<hex>  <filename>"`
    #[error("malformed sidecar line: {0:?}")]
    Malformed(String),

    /// Digest is not hex or has no matching algorithm
    #[error("invalid digest: {0:?}")]
    InvalidDigest(String),
}

/// Algorithm name not recognised
#[derive(Debug, Error)]
#[error("unknown algorithm: {0} (expected md5, sha1, sha256 or sha512)")]
pub struct UnknownAlgorithm(pub String);
