// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod jobs;
pub mod logging;
pub mod scheduler;
pub mod state_log;
pub mod status;
pub mod types;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::RunnerConfig;
use crate::engine::{CoreRuntime, RunSummary, Runtime, RuntimeEvent};
use crate::errors::{Result, RunnerError};
use crate::exec::ProcessExecutor;
use crate::fs::RealFileSystem;
use crate::jobs::{spawn_dir_watcher, spawn_scanner, JobSource};
use crate::scheduler::Scheduler;
use crate::state_log::StateLog;
use crate::status::{spawn_key_reader, StatusReporter, TerminalSink};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let cfg = RunnerConfig::try_from(args)?;
    run_with_config(cfg).await
}

/// Run with an already validated configuration.
///
/// This wires together:
/// - state log replay and scheduler restore
/// - the startup scan (a failure here is a configuration error)
/// - periodic rescans, optionally nudged by a directory watcher
/// - process executor
/// - keyboard control and signal handling
/// - the runtime loop with its status line
pub async fn run_with_config(cfg: RunnerConfig) -> Result<RunSummary> {
    info!(
        program = ?cfg.program,
        dir = ?cfg.jobs_dir,
        pattern = %cfg.pattern,
        concurrency = cfg.concurrency,
        attempts = %cfg.attempt_limit,
        "starting runner"
    );

    let (log, replay) = StateLog::open(&cfg.log_path).await?;
    if replay.had_torn_tail() {
        warn!(path = ?cfg.log_path, "state log ended in a partial entry; it was discarded");
    }

    let mut scheduler = Scheduler::new(cfg.concurrency, cfg.attempt_limit);
    scheduler.restore(&replay);

    let source = JobSource::new(Arc::new(RealFileSystem), &cfg.jobs_dir, &cfg.pattern)
        .map_err(|e| RunnerError::Config(format!("{e:#}")))?;
    let initial = source
        .discover(&HashSet::new())
        .map_err(|e| RunnerError::Config(format!("{e:#}")))?;

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(256);
    let reported: HashSet<_> = initial.iter().cloned().collect();
    rt_tx
        .send(RuntimeEvent::JobsDiscovered { jobs: initial })
        .await
        .map_err(|_| RunnerError::Other(anyhow::anyhow!("runtime channel closed")))?;

    // Directory watcher only shortens the wait; polling still happens.
    let (_watcher, nudges) = if cfg.watch {
        match spawn_dir_watcher(&cfg.jobs_dir) {
            Ok((handle, nudges)) => (Some(handle), Some(nudges)),
            Err(e) => {
                warn!(error = %e, "directory watcher unavailable; polling only");
                (None, None)
            }
        }
    } else {
        (None, None)
    };
    let scanner = spawn_scanner(source, cfg.rescan_interval, reported, rt_tx.clone(), nudges);

    let executor = ProcessExecutor::new(cfg.program.clone(), cfg.jobs_dir.clone(), rt_tx.clone());
    let signals = engine::shutdown::install_shutdown_handler(rt_tx.clone())?;
    let terminal = spawn_key_reader(rt_tx.clone());

    let reporter = StatusReporter::new(Box::new(TerminalSink::new()), Instant::now())
        .with_historical_mean(replay.mean_duration());
    let core = CoreRuntime::new(scheduler, cfg.runtime_options(), cfg.floor);

    let result = Runtime::new(core, rt_rx, rt_tx, executor, log, reporter)
        .run()
        .await;

    scanner.abort();
    signals.abort();
    drop(terminal);
    result
}
