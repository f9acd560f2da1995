//! Human-readable formatting for byte counts, rates and progress.

use std::time::Duration;

const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

fn format_scaled(value: f64) -> String {
    let mut size = if value.is_finite() { value.abs() } else { 0.0 };
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{size:.2} {}", UNITS[unit_idx])
}

/// Format bytes in human-readable format (binary, 1024 base)
///
/// Anything at or beyond 1024 TB is expressed in PB.
///
/// # Example
///
/// ```
/// use r2index_common::format_bytes;
///
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
/// assert_eq!(format_bytes(1024 * 1024 * 1024), "1.00 GB");
/// ```
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    format_scaled(bytes as f64)
}

/// Format a throughput in bytes/sec
///
/// # Example
///
/// ```
/// use r2index_common::format_rate;
///
/// assert_eq!(format_rate(1024.0), "1.00 KB/s");
/// assert_eq!(format_rate(1536.0 * 1024.0), "1.50 MB/s");
/// ```
#[must_use]
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_scaled(bytes_per_sec))
}

/// Format `done / total` as a percentage with one decimal place.
///
/// Returns `None` when `total` is zero, since no meaningful ratio exists.
///
/// # Example
///
/// ```
/// use r2index_common::format_percent;
///
/// assert_eq!(format_percent(524_288, 1_048_576).as_deref(), Some("50.0%"));
/// assert_eq!(format_percent(10, 0), None);
/// ```
#[must_use]
pub fn format_percent(done: u64, total: u64) -> Option<String> {
    if total == 0 {
        return None;
    }
    let pct = done as f64 / total as f64 * 100.0;
    Some(format!("{pct:.1}%"))
}

/// Average throughput over `elapsed`, or zero if no time has passed.
#[must_use]
pub fn bytes_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 { bytes as f64 / secs } else { 0.0 }
}

/// Format duration in human-readable format
///
/// # Example
///
/// ```
/// use r2index_common::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(30)), "30s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
