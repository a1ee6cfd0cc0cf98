// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::errors::{Result, RunnerError};
use crate::exec::ExecutorBackend;
use crate::scheduler::{Dispatch, SchedulerStats};
use crate::state_log::{LogEntry, OutcomeLog};
use crate::status::{wall_clock, StatusReporter};

use super::core::CoreRuntime;
use super::{CoreCommand, ExitReason, RuntimeEvent};

/// What a finished run looked like.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reason: ExitReason,
    pub stats: SchedulerStats,
}

/// Drives the scheduler in response to `RuntimeEvent`s, makes every
/// completion durable, and delegates execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. The one ordering rule enforced here: a completion is
/// appended to the outcome log *before* the core sees it, so nothing is
/// reported as done that a restart would not also consider done.
pub struct Runtime<E: ExecutorBackend, L: OutcomeLog> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    /// Used to deliver `GraceExpired` back into our own loop.
    event_tx: mpsc::Sender<RuntimeEvent>,
    executor: E,
    log: L,
    reporter: StatusReporter,
    grace_timer: Option<JoinHandle<()>>,
}

impl<E: ExecutorBackend, L: OutcomeLog> fmt::Debug for Runtime<E, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend, L: OutcomeLog> Runtime<E, L> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        event_tx: mpsc::Sender<RuntimeEvent>,
        executor: E,
        log: L,
        reporter: StatusReporter,
    ) -> Self {
        Self {
            core,
            event_rx,
            event_tx,
            executor,
            log,
            reporter,
            grace_timer: None,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Persists completions, then feeds events into the core runtime.
    /// - Executes commands returned by the core (dispatch, terminate, exit).
    /// - Refreshes the status line on every change and on a timer.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("runner runtime started");

        let mut ticker = tokio::time::interval(self.core.options().status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let result = loop {
            let event = tokio::select! {
                event = self.event_rx.recv() => event,
                _ = ticker.tick() => {
                    self.render_status();
                    continue;
                }
            };

            let Some(event) = event else {
                info!("runtime event channel closed; exiting");
                break Ok(self.summary(ExitReason::Interrupted));
            };

            debug!(?event, "runtime received event");

            if let Err(err) = self.persist(&event).await {
                error!(error = %err, "cannot record job outcome; stopping");
                self.abort_running().await;
                break Err(err);
            }

            let step = self.core.step(event, now());

            let mut exit = None;
            let mut failure = None;
            for command in step.commands {
                match self.execute_command(command).await {
                    Ok(Some(reason)) => exit = Some(reason),
                    Ok(None) => {}
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
            if let Some(err) = failure {
                error!(error = %err, "executor command failed; stopping");
                self.abort_running().await;
                break Err(err);
            }
            self.render_status();

            if !step.keep_running {
                let reason = exit.unwrap_or(ExitReason::Interrupted);
                info!(?reason, "core requested exit; stopping runtime");
                break self.finish(reason);
            }
        };

        if let Some(timer) = self.grace_timer.take() {
            timer.abort();
        }
        self.render_status();
        info!("runtime exiting");
        result
    }

    /// Durably append a completion before the core may act on it.
    async fn persist(&mut self, event: &RuntimeEvent) -> Result<()> {
        if let RuntimeEvent::JobCompleted {
            job,
            outcome,
            elapsed,
            ..
        } = event
        {
            self.log
                .append(LogEntry::new(job.clone(), *outcome, *elapsed))
                .await?;
        }
        Ok(())
    }

    /// Execute a single command from the core. Returns the exit reason when
    /// the command is `Exit`.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<Option<ExitReason>> {
        match command {
            CoreCommand::Dispatch(jobs) => {
                self.start_jobs(jobs).await?;
            }
            CoreCommand::JobFinished { job, effect } => {
                debug!(job = %job, ?effect, "job finished");
                self.reporter.record_finish(now());
            }
            CoreCommand::StartGracePeriod(grace) => {
                info!(?grace, "grace period started");
                let tx = self.event_tx.clone();
                self.grace_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(grace).await;
                    let _ = tx.send(RuntimeEvent::GraceExpired).await;
                }));
            }
            CoreCommand::TerminateRunning => {
                self.executor.terminate_running().await?;
            }
            CoreCommand::Exit(reason) => return Ok(Some(reason)),
        }
        Ok(None)
    }

    /// Best-effort kill of everything still running, on the way out with an
    /// error.
    async fn abort_running(&mut self) {
        if let Err(err) = self.executor.terminate_running().await {
            warn!(error = %err, "failed to terminate running jobs");
        }
    }

    async fn start_jobs(&mut self, jobs: Vec<Dispatch>) -> Result<()> {
        if jobs.is_empty() {
            return Ok(());
        }
        let ids: Vec<_> = jobs.iter().map(|d| d.job.as_str()).collect();
        debug!(?ids, "starting jobs");
        self.executor.start_jobs(jobs).await
    }

    fn render_status(&mut self) {
        let stats = self.core.stats();
        self.reporter.render(&stats, now(), &wall_clock());
    }

    fn summary(&self, reason: ExitReason) -> RunSummary {
        RunSummary {
            reason,
            stats: self.core.stats(),
        }
    }

    fn finish(&self, reason: ExitReason) -> Result<RunSummary> {
        match reason {
            ExitReason::ScanFailures(msg) => Err(RunnerError::Scan(msg)),
            ExitReason::ExecutorFatal(msg) => Err(RunnerError::Executor(msg)),
            graceful => Ok(self.summary(graceful)),
        }
    }
}

/// Current instant on Tokio's clock, so paused-time tests move it too.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}
