//! Build automation tasks for r2index
//!
//! Run with: cargo xtask <command>

use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::Command;

const FUZZ_TARGETS: [&str; 3] = [
    "fuzz_sidecar_parse",
    "fuzz_chunked_hash",
    "fuzz_tracker_signals",
];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "r2index build automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all tests
    Test,

    /// Run clippy lints
    Lint,

    /// Check formatting
    Fmt,

    /// Run all CI checks
    Ci,

    /// Run criterion benchmarks
    Bench,

    /// Run fuzz targets (requires nightly and cargo-fuzz)
    Fuzz {
        /// Single target to run (default: all)
        target: Option<String>,

        /// Seconds per target
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },

    /// Generate documentation
    Doc,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test => {
            run_command("cargo", &["test", "--all-features", "--workspace"])?;
        }
        Commands::Lint => {
            run_command("cargo", &["clippy", "--workspace", "--", "-D", "warnings"])?;
        }
        Commands::Fmt => {
            run_command("cargo", &["fmt", "--all", "--check"])?;
        }
        Commands::Ci => {
            println!("Running CI checks...");
            run_command("cargo", &["fmt", "--all", "--check"])?;
            run_command("cargo", &["clippy", "--workspace", "--", "-D", "warnings"])?;
            run_command("cargo", &["test", "--all-features", "--workspace"])?;
            println!("All CI checks passed!");
        }
        Commands::Bench => {
            run_command("cargo", &["bench", "-p", "r2index-integration-tests"])?;
        }
        Commands::Fuzz { target, seconds } => {
            let max_time = format!("-max_total_time={seconds}");
            let targets: Vec<&str> = match &target {
                Some(name) => {
                    if !FUZZ_TARGETS.contains(&name.as_str()) {
                        anyhow::bail!(
                            "Unknown fuzz target: {}. Must be one of: {}",
                            name,
                            FUZZ_TARGETS.join(", ")
                        );
                    }
                    vec![name.as_str()]
                }
                None => FUZZ_TARGETS.to_vec(),
            };
            for name in targets {
                println!("Fuzzing {name} for {seconds}s...");
                run_in(
                    Path::new("fuzz"),
                    "cargo",
                    &["+nightly", "fuzz", "run", name, "--", &max_time],
                )?;
            }
        }
        Commands::Doc => {
            run_command("cargo", &["doc", "--workspace", "--no-deps", "--open"])?;
        }
    }

    Ok(())
}

fn run_command(program: &str, args: &[&str]) -> anyhow::Result<()> {
    run_in(Path::new("."), program, args)
}

fn run_in(dir: &Path, program: &str, args: &[&str]) -> anyhow::Result<()> {
    let status = Command::new(program).args(args).current_dir(dir).status()?;

    if !status.success() {
        anyhow::bail!("{} {:?} failed", program, args);
    }

    Ok(())
}
