// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::RuntimeOptions;
use crate::types::{AttemptLimit, ConcurrencyFloor};

/// Fully validated run configuration.
///
/// Built from `CliArgs` through `TryFrom`; every field is known to be usable.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Resolved path of the command to run per job.
    pub program: PathBuf,
    pub jobs_dir: PathBuf,
    pub pattern: String,
    /// `<jobs_dir>/.<command>.log`
    pub log_path: PathBuf,
    pub concurrency: usize,
    pub floor: ConcurrencyFloor,
    pub attempt_limit: AttemptLimit,
    pub rescan_interval: Duration,
    pub max_scan_failures: u32,
    pub grace_period: Duration,
    pub once: bool,
    pub watch: bool,
}

impl RunnerConfig {
    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            exit_when_idle: self.once,
            max_scan_failures: self.max_scan_failures,
            grace_period: self.grace_period,
            ..RuntimeOptions::default()
        }
    }
}
