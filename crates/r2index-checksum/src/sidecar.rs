//! Sidecar checksum files.
//!
//! A sidecar sits next to the file it describes, named `<file>.<algorithm>`,
//! and holds one line in the format used by common checksum utilities:
//!
//! ```text
//! <hex-digest>  <filename>
//! ```
//!
//! Two spaces separate digest and name. On read, the `" *"` binary-mode
//! marker is accepted as well.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SidecarError;
use crate::{Algorithm, ChecksumResult};

/// One parsed sidecar line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarEntry {
    /// Algorithm inferred from the digest length
    pub algorithm: Algorithm,
    /// Lowercase hex digest
    pub digest: String,
    /// File name as written in the sidecar
    pub filename: String,
}

/// Render one sidecar line, including the trailing newline
///
/// # Example
///
/// ```
/// use r2index_checksum::sidecar::sidecar_line;
///
/// assert_eq!(sidecar_line("abc123", "data.bin"), "abc123  data.bin\n");
/// ```
#[must_use]
pub fn sidecar_line(digest: &str, filename: &str) -> String {
    format!("{digest}  {filename}\n")
}

/// Sidecar path for `file`: the file path with `.<algorithm>` appended
#[must_use]
pub fn sidecar_path(file: &Path, algorithm: Algorithm) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".");
    name.push(algorithm.name());
    PathBuf::from(name)
}

fn display_name(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string_lossy().into_owned())
}

/// Write the sidecar for one algorithm and return its path
///
/// # Errors
///
/// Returns [`SidecarError::Io`] if the sidecar cannot be written.
pub fn write_sidecar(
    file: &Path,
    algorithm: Algorithm,
    result: &ChecksumResult,
) -> Result<PathBuf, SidecarError> {
    let path = sidecar_path(file, algorithm);
    let line = sidecar_line(result.digest(algorithm), &display_name(file));
    fs::write(&path, line).map_err(|source| SidecarError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!("Wrote {} sidecar {}", algorithm, path.display());
    Ok(path)
}

/// Write sidecars for each of `algorithms`
///
/// # Errors
///
/// Stops at the first sidecar that cannot be written.
pub fn write_sidecars(
    file: &Path,
    algorithms: &[Algorithm],
    result: &ChecksumResult,
) -> Result<Vec<PathBuf>, SidecarError> {
    algorithms
        .iter()
        .map(|&algorithm| write_sidecar(file, algorithm, result))
        .collect()
}

/// Parse one sidecar line
///
/// # Errors
///
/// Returns [`SidecarError::Malformed`] if the separator or file name is
/// missing, and [`SidecarError::InvalidDigest`] if the digest is not hex or
/// has a length matching no algorithm.
pub fn parse_sidecar_line(line: &str) -> Result<SidecarEntry, SidecarError> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let (digest, rest) = trimmed
        .split_once(' ')
        .ok_or_else(|| SidecarError::Malformed(line.to_string()))?;

    let filename = rest
        .strip_prefix(' ')
        .or_else(|| rest.strip_prefix('*'))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| SidecarError::Malformed(line.to_string()))?;

    if !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SidecarError::InvalidDigest(digest.to_string()));
    }
    let algorithm = Algorithm::from_hex_len(digest.len())
        .ok_or_else(|| SidecarError::InvalidDigest(digest.to_string()))?;

    Ok(SidecarEntry {
        algorithm,
        digest: digest.to_ascii_lowercase(),
        filename: filename.to_string(),
    })
}

/// Read the first non-empty line of a sidecar file
///
/// # Errors
///
/// Returns [`SidecarError::Io`] if the file cannot be read, or a parse error.
pub fn read_sidecar(path: &Path) -> Result<SidecarEntry, SidecarError> {
    let contents = fs::read_to_string(path).map_err(|source| SidecarError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let line = contents
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| SidecarError::Malformed(String::new()))?;
    parse_sidecar_line(line)
}

/// Check `result` against the sidecar of `file` for `algorithm`
///
/// Only the digest is compared; the recorded file name may differ after a
/// rename.
///
/// # Errors
///
/// Returns an error if the sidecar is missing, unreadable or malformed, or
/// if it holds a digest of a different algorithm.
pub fn verify_sidecar(
    file: &Path,
    algorithm: Algorithm,
    result: &ChecksumResult,
) -> Result<bool, SidecarError> {
    let entry = read_sidecar(&sidecar_path(file, algorithm))?;
    if entry.algorithm != algorithm {
        return Err(SidecarError::InvalidDigest(entry.digest));
    }
    Ok(entry.digest == result.digest(algorithm))
}
