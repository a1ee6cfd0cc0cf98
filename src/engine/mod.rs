// src/engine/mod.rs

//! Orchestration engine for runner.
//!
//! This module ties together:
//! - the job scheduler (queue, slots, retries)
//! - the main runtime event loop that reacts to:
//!   - newly discovered jobs and scan failures
//!   - job completion events from the executor
//!   - keypresses that change desired concurrency
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Duration;

use crate::status::KeyCommand;

/// Canonical job identifier: the job file's path relative to the job directory.
pub type JobId = String;

/// Outcome of a single execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Exit once nothing is pending or running (used for `--once`).
    pub exit_when_idle: bool,
    /// Consecutive scan failures tolerated before the run is aborted.
    pub max_scan_failures: u32,
    /// How long in-flight jobs may keep running after an interrupt.
    pub grace_period: Duration,
    /// How often the status line is refreshed.
    pub status_interval: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            exit_when_idle: false,
            max_scan_failures: 5,
            grace_period: Duration::from_secs(10),
            status_interval: Duration::from_secs(1),
        }
    }
}

/// Events flowing into the runtime from the scanner, executor, input, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A directory scan listed these ids (already sorted).
    JobsDiscovered { jobs: Vec<JobId> },
    /// A directory scan failed.
    ScanFailed { error: String },
    /// A slot finished executing a job.
    JobCompleted {
        slot: usize,
        job: JobId,
        outcome: Outcome,
        elapsed: Duration,
    },
    /// The executor cannot run the command at all (e.g. it vanished).
    ExecutorFatal { error: String },
    /// A keypress relevant to the scheduler.
    Key(KeyCommand),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
    /// The shutdown grace period has elapsed.
    GraceExpired,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;
pub mod shutdown;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep, ExitReason, Phase};
pub use runtime::{Runtime, RunSummary};
