//! # r2index checksum
//!
//! Streaming checksum engine for large files.
//!
//! This crate provides:
//! - MD5, SHA-1, SHA-256 and SHA-512 computed over one sequential read pass
//! - Bounded memory use regardless of input size (fixed-size read buffer)
//! - Throttled read-progress reporting through an optional observer
//! - Blocking-pool offload for callers running on a tokio runtime
//! - Sidecar checksum files in the `"<hex>  <filename>"` format
//!
//! ## Digest Suite
//!
//! | Algorithm | Hex length | Sidecar extension |
//! |-----------|------------|-------------------|
//! | MD5 | 32 | `.md5` |
//! | SHA-1 | 40 | `.sha1` |
//! | SHA-256 | 64 | `.sha256` |
//! | SHA-512 | 128 | `.sha512` |
//!
//! All four are produced for compatibility with varied consumers, not for
//! their relative strength.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithm;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod sidecar;

use serde::{Deserialize, Serialize};

pub use algorithm::Algorithm;
pub use engine::{
    ChecksumEngine, ChecksumObserver, checksum_bytes, compute_checksums,
    compute_checksums_async, compute_checksums_from_reader,
};
pub use error::{ChecksumError, SidecarError, UnknownAlgorithm};
pub use hasher::MultiHasher;

/// Default read size (8 MiB)
///
/// Bounds peak memory on arbitrarily large files while keeping the number
/// of read syscalls low.
pub const CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Digests and byte count of one input, produced by a single read pass
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecksumResult {
    /// MD5 digest, lowercase hex
    pub md5: String,
    /// SHA-1 digest, lowercase hex
    pub sha1: String,
    /// SHA-256 digest, lowercase hex
    pub sha256: String,
    /// SHA-512 digest, lowercase hex
    pub sha512: String,
    /// Total bytes consumed
    pub size: u64,
}

impl ChecksumResult {
    /// Hex digest for one algorithm
    #[must_use]
    pub fn digest(&self, algorithm: Algorithm) -> &str {
        match algorithm {
            Algorithm::Md5 => &self.md5,
            Algorithm::Sha1 => &self.sha1,
            Algorithm::Sha256 => &self.sha256,
            Algorithm::Sha512 => &self.sha512,
        }
    }
}
