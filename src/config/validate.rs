// src/config/validate.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::RunnerConfig;
use crate::errors::{Result, RunnerError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::jobs::build_matcher;
use crate::state_log::log_path_for;
use crate::types::AttemptLimit;

impl TryFrom<CliArgs> for RunnerConfig {
    type Error = RunnerError;

    fn try_from(args: CliArgs) -> std::result::Result<Self, Self::Error> {
        validate_args(args, &RealFileSystem, std::env::var_os("PATH"))
    }
}

/// Check every argument that could make the run fail before it starts.
///
/// `search_path` is the value of `PATH` used to resolve bare command names.
pub fn validate_args(
    args: CliArgs,
    fs: &dyn FileSystem,
    search_path: Option<OsString>,
) -> Result<RunnerConfig> {
    validate_jobs_dir(&args.jobs_dir, fs)?;
    validate_pattern(&args.pattern)?;
    let program = resolve_command(&args.command, fs, search_path)?;

    if args.rescan_interval == 0 {
        return Err(RunnerError::Config(
            "--rescan-interval must be >= 1 (got 0)".to_string(),
        ));
    }
    if args.max_scan_failures == 0 {
        return Err(RunnerError::Config(
            "--max-scan-failures must be >= 1 (got 0)".to_string(),
        ));
    }

    let log_path = log_path_for(&args.jobs_dir, &program);

    Ok(RunnerConfig {
        program,
        jobs_dir: args.jobs_dir,
        pattern: args.pattern,
        log_path,
        concurrency: args.concurrency,
        floor: args.min_concurrency,
        attempt_limit: AttemptLimit::from_option(args.max_attempts),
        rescan_interval: Duration::from_secs(args.rescan_interval),
        max_scan_failures: args.max_scan_failures,
        grace_period: Duration::from_secs(args.grace_period),
        once: args.once,
        watch: !args.no_watch,
    })
}

fn validate_jobs_dir(dir: &Path, fs: &dyn FileSystem) -> Result<()> {
    if fs.is_dir(dir) {
        return Ok(());
    }
    let problem = if fs.exists(dir) {
        "is not a directory"
    } else {
        "does not exist"
    };
    Err(RunnerError::Config(format!(
        "job directory {} {problem}",
        dir.display()
    )))
}

fn validate_pattern(pattern: &str) -> Result<()> {
    build_matcher(pattern)
        .map(|_| ())
        .map_err(|e| RunnerError::Config(format!("{e:#}")))
}

/// Resolve `command` the way a shell would.
///
/// A command containing a path separator must name an executable file
/// directly; a bare name is looked up in each directory of `search_path`.
pub fn resolve_command(
    command: &str,
    fs: &dyn FileSystem,
    search_path: Option<OsString>,
) -> Result<PathBuf> {
    if command.is_empty() {
        return Err(RunnerError::Config("command must not be empty".to_string()));
    }

    if command.contains(std::path::MAIN_SEPARATOR) || command.contains('/') {
        let path = PathBuf::from(command);
        if fs.is_executable(&path) {
            return Ok(path);
        }
        return Err(RunnerError::Config(format!(
            "command {command} is not an executable file"
        )));
    }

    search_path
        .iter()
        .flat_map(std::env::split_paths)
        .map(|dir| dir.join(command))
        .find(|candidate| fs.is_executable(candidate))
        .ok_or_else(|| RunnerError::Config(format!("command {command} not found on PATH")))
}
