//! r2index CLI
//!
//! Multi-digest checksums, sidecar verification and progress-tracked copies.

mod config;
mod progress;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use r2index_checksum::{Algorithm, ChecksumEngine, ChecksumResult, sidecar};
use r2index_common::{bytes_per_second, format_bytes, format_duration, format_rate};
use r2index_progress::{ProgressTracker, SignalMode, TransferKind, TransferOptions};

use config::Config;
use progress::TransferProgress;

/// How often the terminal bar is refreshed while hashing
const BAR_REFRESH: Duration = Duration::from_millis(100);

/// r2index - checksums and progress for object-store transfers
#[derive(Parser)]
#[command(name = "r2index")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to <config dir>/r2index/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute MD5, SHA-1, SHA-256 and SHA-512 in one pass
    Checksum {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write `<file>.<algorithm>` sidecar files
        #[arg(long)]
        sidecar: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a file against its sidecar checksums
    Verify {
        /// File to verify
        #[arg(required = true)]
        file: PathBuf,

        /// Algorithms to check (default: every sidecar present)
        #[arg(short, long = "algorithm")]
        algorithms: Vec<Algorithm>,
    },

    /// Copy a file in chunks, reporting progress like an upload
    Copy {
        /// Source file
        #[arg(required = true)]
        src: PathBuf,

        /// Destination file
        #[arg(required = true)]
        dst: PathBuf,

        /// Compare checksums of source and destination afterwards
        #[arg(long)]
        verify: bool,
    },

    /// Print the effective configuration
    Config {
        /// Also write it to the config file path
        #[arg(long)]
        write: bool,
    },
}

/// One entry of `checksum --json` output
#[derive(Serialize)]
struct FileChecksums<'a> {
    file: String,
    #[serde(flatten)]
    checksums: &'a ChecksumResult,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default()?,
    };

    // Validate configuration
    config.validate()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(level.as_str())
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Checksum {
            files,
            sidecar,
            json,
        } => {
            checksum_files(&files, sidecar, json, &config).await?;
        }
        Commands::Verify { file, algorithms } => {
            verify_file(&file, &algorithms, &config).await?;
        }
        Commands::Copy { src, dst, verify } => {
            copy_file(src, dst, verify, &config).await?;
        }
        Commands::Config { write } => {
            show_config(write, cli.config.as_deref(), &config)?;
        }
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Hash one file with a bar attached to the engine observer
async fn hash_with_bar(
    file: &Path,
    action: &str,
    show_bar: bool,
    config: &Config,
) -> anyhow::Result<ChecksumResult> {
    let size = std::fs::metadata(file).map(|m| m.len()).unwrap_or(0);
    let progress = if show_bar {
        TransferProgress::new(size, action, &display_name(file))
    } else {
        TransferProgress::hidden()
    };

    let engine = ChecksumEngine::new()
        .with_chunk_size(config.checksum.chunk_size)
        .with_progress(BAR_REFRESH, progress.observer());

    match engine.compute_from_path_async(file).await {
        Ok(result) => {
            progress.finish_with_message(format!("{action}: {} done", display_name(file)));
            Ok(result)
        }
        Err(e) => {
            progress.abandon();
            Err(e).with_context(|| format!("Checksum failed for {}", file.display()))
        }
    }
}

/// Compute and print checksums for each file
async fn checksum_files(
    files: &[PathBuf],
    write_sidecars: bool,
    json: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let mut results = Vec::with_capacity(files.len());

    for file in files {
        tracing::info!("Hashing {}", file.display());
        let result = hash_with_bar(file, "Hashing", !json, config).await?;

        if write_sidecars {
            let written =
                sidecar::write_sidecars(file, &config.checksum.sidecar_algorithms, &result)
                    .with_context(|| format!("Failed to write sidecars for {}", file.display()))?;
            tracing::info!("Wrote {} sidecar(s) for {}", written.len(), file.display());
        }

        results.push((file, result));
    }

    if json {
        let entries: Vec<FileChecksums<'_>> = results
            .iter()
            .map(|(file, checksums)| FileChecksums {
                file: file.display().to_string(),
                checksums,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (file, result) in &results {
        println!("{} ({})", file.display(), format_bytes(result.size));
        for algorithm in Algorithm::ALL {
            println!("  {:<7} {}", algorithm.name(), result.digest(algorithm));
        }
    }

    Ok(())
}

/// Recompute checksums and compare against sidecar files
async fn verify_file(file: &Path, algorithms: &[Algorithm], config: &Config) -> anyhow::Result<()> {
    let algorithms: Vec<Algorithm> = if algorithms.is_empty() {
        Algorithm::ALL
            .into_iter()
            .filter(|&alg| sidecar::sidecar_path(file, alg).exists())
            .collect()
    } else {
        algorithms.to_vec()
    };

    if algorithms.is_empty() {
        anyhow::bail!("No sidecar checksum files found for {}", file.display());
    }

    let result = hash_with_bar(file, "Verifying", true, config).await?;

    let mut failures = 0usize;
    for algorithm in algorithms {
        let matched = sidecar::verify_sidecar(file, algorithm, &result)
            .with_context(|| format!("Failed to read {algorithm} sidecar for {}", file.display()))?;
        if matched {
            println!("{}: {} {}", file.display(), algorithm, style("OK").green());
        } else {
            failures += 1;
            println!("{}: {} {}", file.display(), algorithm, style("FAILED").red().bold());
        }
    }

    if failures > 0 {
        anyhow::bail!("{} checksum mismatch(es) for {}", failures, file.display());
    }

    Ok(())
}

/// Copy `src` to `dst` chunk by chunk, reporting progress like an upload
async fn copy_file(src: PathBuf, dst: PathBuf, verify: bool, config: &Config) -> anyhow::Result<()> {
    tracing::info!("Copying {} to {}", src.display(), dst.display());
    config.transfer.log(TransferKind::Upload);

    let size = std::fs::metadata(&src)
        .with_context(|| format!("Failed to stat {}", src.display()))?
        .len();
    let progress = TransferProgress::new(size, "Copying", &display_name(&src));

    let options = TransferOptions::new()
        .with_interval(config.progress.interval())
        .with_mode(SignalMode::Incremental)
        .with_callback(progress.callback());
    let tracker = options.upload_tracker(&src).map(Arc::new);

    let started = Instant::now();
    let chunk_size = config.checksum.chunk_size;
    let worker_tracker = tracker.clone();
    let (worker_src, worker_dst) = (src.clone(), dst.clone());
    let copied = tokio::task::spawn_blocking(move || {
        copy_chunks(&worker_src, &worker_dst, chunk_size, worker_tracker.as_deref())
    })
    .await
    .context("Copy worker failed")?;

    let copied = match copied {
        Ok(copied) => copied,
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };

    if let Some(tracker) = &tracker {
        tracker.finish();
    }
    let elapsed = started.elapsed();
    progress.finish_with_message(format!(
        "Copied {} in {} ({})",
        format_bytes(copied),
        format_duration(elapsed),
        format_rate(bytes_per_second(copied, elapsed))
    ));

    if verify {
        let engine = ChecksumEngine::new().with_chunk_size(chunk_size);
        let (source, copy) = tokio::try_join!(
            engine.compute_from_path_async(&src),
            engine.compute_from_path_async(&dst)
        )
        .context("Post-copy checksum failed")?;

        if source != copy {
            anyhow::bail!(
                "Checksum mismatch: {} sha256={} but {} sha256={}",
                src.display(),
                source.sha256,
                dst.display(),
                copy.sha256
            );
        }
        println!("{}: {}", dst.display(), style("verified").green());
    }

    Ok(())
}

/// The transfer loop: read a chunk, write it, signal its length
fn copy_chunks(
    src: &Path,
    dst: &Path,
    chunk_size: usize,
    tracker: Option<&ProgressTracker>,
) -> anyhow::Result<u64> {
    let mut reader =
        File::open(src).with_context(|| format!("Failed to open {}", src.display()))?;
    let mut writer =
        File::create(dst).with_context(|| format!("Failed to create {}", dst.display()))?;

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut copied = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", src.display()));
            }
        };
        writer
            .write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", dst.display()))?;
        copied += n as u64;
        if let Some(tracker) = tracker {
            tracker.on_signal(n as u64);
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", dst.display()))?;
    Ok(copied)
}

/// Print the effective configuration, optionally saving it
fn show_config(write: bool, path: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);

    if write {
        let path = path.map_or_else(Config::default_path, Path::to_path_buf);
        config
            .save(&path)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        println!("\nSaved to {}", path.display());
    }

    Ok(())
}
