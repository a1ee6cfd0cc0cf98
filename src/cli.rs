// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::ConcurrencyFloor;

/// Command-line arguments for `runner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runner",
    version,
    about = "Run a command once per job file, concurrently, with retries and resumable progress.",
    long_about = None
)]
pub struct CliArgs {
    /// Command to execute; receives the job file path as its only argument.
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Directory containing the job files.
    #[arg(value_name = "JOBS_DIR")]
    pub jobs_dir: PathBuf,

    /// Glob that job file names must match.
    #[arg(value_name = "FILE_PATTERN", default_value = "*")]
    pub pattern: String,

    /// Initial desired concurrency. Adjust live with `+` / `-`.
    #[arg(short = 'j', long, value_name = "N", default_value_t = 1)]
    pub concurrency: usize,

    /// Lowest concurrency the `-` key can reach.
    #[arg(long, value_enum, value_name = "FLOOR", default_value = "zero")]
    pub min_concurrency: ConcurrencyFloor,

    /// Attempts per job before a failure is terminal (0 or omitted: retry forever).
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Seconds between job directory rescans.
    #[arg(long, value_name = "SECS", default_value_t = 2)]
    pub rescan_interval: u64,

    /// Consecutive failed rescans tolerated before giving up.
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub max_scan_failures: u32,

    /// Seconds to let running jobs finish after an interrupt before killing them.
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub grace_period: u64,

    /// Exit once every known job has reached a terminal state.
    #[arg(long)]
    pub once: bool,

    /// Only rescan on the interval; don't watch the directory for changes.
    #[arg(long)]
    pub no_watch: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
