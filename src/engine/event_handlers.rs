// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::engine::{JobId, Outcome, RuntimeOptions};
use crate::scheduler::{CompletionEffect, Dispatch, Scheduler};
use crate::status::{next_concurrency, KeyCommand};
use crate::types::ConcurrencyFloor;

/// Lifecycle of the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Dispatching normally.
    Running,
    /// Interrupted: no new dispatch, waiting for running jobs.
    Draining,
    /// Exit decided.
    Stopped,
}

/// Why the run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Every known job is terminal (only with `exit_when_idle`).
    Completed,
    /// Interrupted and drained (or terminated after the grace period).
    Interrupted,
    /// Scanning failed too many times in a row.
    ScanFailures(String),
    /// The executor cannot run the command.
    ExecutorFatal(String),
}

impl ExitReason {
    pub fn is_graceful(&self) -> bool {
        matches!(self, ExitReason::Completed | ExitReason::Interrupted)
    }
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these jobs to the executor.
    Dispatch(Vec<Dispatch>),
    /// A job reached a terminal state (feeds the throughput estimate).
    JobFinished { job: JobId, effect: CompletionEffect },
    /// Arm a timer that delivers `GraceExpired` after this long.
    StartGracePeriod(Duration),
    /// Kill every running job now.
    TerminateRunning,
    /// Stop the runtime loop.
    Exit(ExitReason),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    pub fn exit_with(mut commands: Vec<CoreCommand>, reason: ExitReason) -> Self {
        commands.push(CoreCommand::Exit(reason));
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// Mutable pieces of the core that handlers operate on.
pub struct CoreContext<'a> {
    pub scheduler: &'a mut Scheduler,
    pub phase: &'a mut Phase,
    pub scan_failures: &'a mut u32,
    pub scanned: &'a mut bool,
    pub options: &'a RuntimeOptions,
    pub floor: ConcurrencyFloor,
}

/// Dispatch whatever capacity allows, if dispatching is still allowed.
fn dispatch_ready(ctx: &mut CoreContext<'_>, now: Instant, commands: &mut Vec<CoreCommand>) {
    if *ctx.phase != Phase::Running {
        return;
    }
    let ready = ctx.scheduler.tick(now);
    if !ready.is_empty() {
        commands.push(CoreCommand::Dispatch(ready));
    }
}

/// Shared tail of every handler: stop when the run is over.
fn finish_step(ctx: &mut CoreContext<'_>, commands: Vec<CoreCommand>) -> CoreStep {
    let reason = match *ctx.phase {
        Phase::Draining if ctx.scheduler.running() == 0 => Some(ExitReason::Interrupted),
        Phase::Running
            if ctx.options.exit_when_idle && *ctx.scanned && ctx.scheduler.is_idle() =>
        {
            Some(ExitReason::Completed)
        }
        _ => None,
    };

    match reason {
        Some(reason) => {
            *ctx.phase = Phase::Stopped;
            info!(?reason, "run finished");
            CoreStep::exit_with(commands, reason)
        }
        None => CoreStep::continue_with(commands),
    }
}

/// New ids from a directory scan.
pub fn handle_jobs_discovered(
    ctx: &mut CoreContext<'_>,
    jobs: Vec<JobId>,
    now: Instant,
) -> CoreStep {
    *ctx.scan_failures = 0;
    *ctx.scanned = true;

    let added = ctx.scheduler.ingest(jobs);
    if added > 0 {
        info!(added, known = ctx.scheduler.known_ids().len(), "discovered new jobs");
    }

    let mut commands = Vec::new();
    dispatch_ready(ctx, now, &mut commands);
    finish_step(ctx, commands)
}

/// A scan failed; fatal once failures persist.
pub fn handle_scan_failed(ctx: &mut CoreContext<'_>, error: String) -> CoreStep {
    *ctx.scan_failures += 1;
    let failures = *ctx.scan_failures;

    if failures >= ctx.options.max_scan_failures {
        error!(failures, %error, "job directory unreadable; giving up");
        *ctx.phase = Phase::Stopped;
        return CoreStep::exit_with(
            vec![CoreCommand::TerminateRunning],
            ExitReason::ScanFailures(format!("{failures} consecutive scan failures, last: {error}")),
        );
    }

    warn!(failures, max = ctx.options.max_scan_failures, %error, "scan failed; will retry");
    CoreStep::continue_with(Vec::new())
}

/// A slot finished. The entry is already durable when this runs.
pub fn handle_job_completed(
    ctx: &mut CoreContext<'_>,
    slot: usize,
    job: JobId,
    outcome: Outcome,
    now: Instant,
) -> CoreStep {
    let mut commands = Vec::new();

    match ctx.scheduler.on_completion(slot, &job, outcome) {
        Some(effect) => {
            match effect {
                CompletionEffect::Succeeded => debug!(job = %job, "job succeeded"),
                CompletionEffect::Requeued { attempts } => {
                    info!(job = %job, attempts, "job failed; queued for retry")
                }
                CompletionEffect::Exhausted { attempts } => {
                    warn!(job = %job, attempts, "job failed; no attempts left")
                }
            }
            if effect.is_terminal() {
                commands.push(CoreCommand::JobFinished { job, effect });
            }
        }
        None => debug!(job = %job, slot, "ignored stale completion"),
    }

    dispatch_ready(ctx, now, &mut commands);
    finish_step(ctx, commands)
}

/// `+` / `-` / `q`.
pub fn handle_key(ctx: &mut CoreContext<'_>, key: KeyCommand, now: Instant) -> CoreStep {
    if key == KeyCommand::Quit {
        return handle_shutdown_requested(ctx);
    }

    let mut commands = Vec::new();
    if let Some(n) = next_concurrency(key, ctx.scheduler.desired(), ctx.floor) {
        ctx.scheduler.set_concurrency(i64::try_from(n).unwrap_or(i64::MAX));
        dispatch_ready(ctx, now, &mut commands);
    }
    finish_step(ctx, commands)
}

/// Interrupt: stop dispatching and drain; a second interrupt kills.
pub fn handle_shutdown_requested(ctx: &mut CoreContext<'_>) -> CoreStep {
    match *ctx.phase {
        Phase::Running => {
            *ctx.phase = Phase::Draining;
            let running = ctx.scheduler.running();
            info!(running, "interrupt received; waiting for running jobs");
            let mut commands = Vec::new();
            if running > 0 {
                commands.push(CoreCommand::StartGracePeriod(ctx.options.grace_period));
            }
            finish_step(ctx, commands)
        }
        Phase::Draining => {
            warn!(running = ctx.scheduler.running(), "second interrupt; terminating running jobs");
            handle_grace_expired(ctx)
        }
        Phase::Stopped => CoreStep::exit_with(Vec::new(), ExitReason::Interrupted),
    }
}

/// Grace period over: kill whatever still runs and stop.
pub fn handle_grace_expired(ctx: &mut CoreContext<'_>) -> CoreStep {
    if *ctx.phase != Phase::Draining {
        return CoreStep::continue_with(Vec::new());
    }
    *ctx.phase = Phase::Stopped;
    CoreStep::exit_with(vec![CoreCommand::TerminateRunning], ExitReason::Interrupted)
}

/// The command cannot be executed at all.
pub fn handle_executor_fatal(ctx: &mut CoreContext<'_>, error: String) -> CoreStep {
    error!(%error, "executor failure; aborting run");
    *ctx.phase = Phase::Stopped;
    CoreStep::exit_with(vec![CoreCommand::TerminateRunning], ExitReason::ExecutorFatal(error))
}
