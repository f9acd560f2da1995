//! Configuration system for the r2index CLI.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use r2index_checksum::{Algorithm, CHUNK_SIZE};
use r2index_progress::TransferConfig;

/// Largest accepted hashing/copy chunk (64 MiB)
const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// r2index configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Checksum configuration
    #[serde(default)]
    pub checksum: ChecksumConfig,
    /// Progress reporting configuration
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Transfer backend configuration
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Checksum configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumConfig {
    /// Read chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Algorithms written as sidecars by `checksum --sidecar`
    #[serde(default = "default_sidecar_algorithms")]
    pub sidecar_algorithms: Vec<Algorithm>,
}

/// Progress reporting configuration
///
/// A `[progress]` table without `interval_secs` disables progress log lines;
/// a missing table keeps the 10 second default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Seconds between progress log lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<f64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_chunk_size() -> usize {
    CHUNK_SIZE
}

fn default_sidecar_algorithms() -> Vec<Algorithm> {
    Algorithm::ALL.to_vec()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            sidecar_algorithms: default_sidecar_algorithms(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval_secs: Some(r2index_progress::DEFAULT_PROGRESS_INTERVAL.as_secs_f64()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ProgressConfig {
    /// Log interval, `None` when progress lines are disabled
    ///
    /// Call after [`Config::validate`]; invalid values are treated as disabled.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("r2index/config.toml")
    }

    /// Load config from the default path, falling back to defaults
    ///
    /// Unlike [`Config::save`], nothing is written when the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config cannot be read or parsed.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();

        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.checksum.chunk_size == 0 || self.checksum.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!("Chunk size must be between 1 byte and 64MB");
        }

        if let Some(secs) = self.progress.interval_secs {
            if !secs.is_finite() || secs < 0.0 {
                anyhow::bail!("Progress interval must be a non-negative number of seconds");
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        if self.transfer.max_concurrency == 0 {
            anyhow::bail!("Max concurrency must be at least 1");
        }

        if self.transfer.multipart_chunksize == 0 {
            anyhow::bail!("Multipart chunk size must be at least 1 byte");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.checksum.chunk_size, 8 * 1024 * 1024);
        assert_eq!(config.checksum.sidecar_algorithms.len(), 4);
        assert_eq!(config.progress.interval(), Some(Duration::from_secs(10)));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.checksum.chunk_size = 0;
        assert!(config.validate().is_err());
        config.checksum.chunk_size = MAX_CHUNK_SIZE + 1;
        assert!(config.validate().is_err());
        config.checksum.chunk_size = 1;
        assert!(config.validate().is_ok());

        config.progress.interval_secs = Some(-1.0);
        assert!(config.validate().is_err());
        config.progress.interval_secs = Some(f64::NAN);
        assert!(config.validate().is_err());
        config.progress.interval_secs = Some(0.0);
        assert!(config.validate().is_ok());

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.transfer.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.checksum.chunk_size, deserialized.checksum.chunk_size);
        assert_eq!(
            config.checksum.sidecar_algorithms,
            deserialized.checksum.sidecar_algorithms
        );
        assert_eq!(config.progress.interval_secs, deserialized.progress.interval_secs);
        assert_eq!(config.transfer, deserialized.transfer);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [checksum]
            sidecar_algorithms = ["sha256", "md5"]

            [transfer]
            max_concurrency = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.checksum.chunk_size, CHUNK_SIZE);
        assert_eq!(
            config.checksum.sidecar_algorithms,
            vec![Algorithm::Sha256, Algorithm::Md5]
        );
        assert_eq!(config.transfer.max_concurrency, 3);
        assert_eq!(config.transfer.multipart_threshold, 100 * 1024 * 1024);
        assert!(config.transfer.use_threads);
        assert_eq!(config.progress.interval(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_empty_progress_table_disables_lines() {
        let config: Config = toml::from_str("[progress]\n").unwrap();
        assert_eq!(config.progress.interval(), None);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let parsed: Result<Config, _> =
            toml::from_str("[checksum]\nsidecar_algorithms = [\"crc32\"]\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.progress.interval_secs = Some(2.5);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.progress.interval(), Some(Duration::from_millis(2500)));
    }
}
