// src/exec/job_runner.rs

//! Runs one job attempt as a child process.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{Outcome, RuntimeEvent};
use crate::scheduler::Dispatch;

/// What the runtime needs to know about a failed spawn.
#[derive(Debug, PartialEq, Eq)]
pub enum SpawnFailure {
    /// The command itself is unusable; every job would fail the same way.
    Fatal,
    /// Probably transient (e.g. out of processes); counts as a failed attempt.
    Attempt,
}

pub fn classify_spawn_error(kind: ErrorKind) -> SpawnFailure {
    match kind {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => SpawnFailure::Fatal,
        _ => SpawnFailure::Attempt,
    }
}

/// Run `program <jobs_dir>/<job>` and report the outcome to the runtime.
///
/// - Output is inherited; the runner never captures it.
/// - stdin is closed so the child can't steal keypresses.
/// - On Unix the child leads its own process group, so a terminal Ctrl-C
///   reaches only the runner and in-flight jobs are left to finish.
/// - If `cancel_rx` fires, the child is killed and **no** completion is sent,
///   so the job has no log entry and is retried after a restart.
pub async fn run_job(
    program: PathBuf,
    jobs_dir: PathBuf,
    dispatch: Dispatch,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let job_path = job_path(&jobs_dir, &dispatch.job);
    let started = Instant::now();

    info!(
        job = %dispatch.job,
        slot = dispatch.slot,
        attempt = dispatch.attempt,
        "starting job"
    );

    let mut cmd = Command::new(&program);
    cmd.arg(&job_path)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let event = match classify_spawn_error(e.kind()) {
                SpawnFailure::Fatal => RuntimeEvent::ExecutorFatal {
                    error: format!("cannot execute {}: {e}", program.display()),
                },
                SpawnFailure::Attempt => {
                    warn!(job = %dispatch.job, error = %e, "failed to start job");
                    RuntimeEvent::JobCompleted {
                        slot: dispatch.slot,
                        job: dispatch.job,
                        outcome: Outcome::Failed,
                        elapsed: started.elapsed(),
                    }
                }
            };
            let _ = runtime_tx.send(event).await;
            return;
        }
    };

    tokio::select! {
        status = child.wait() => {
            let outcome = match &status {
                Ok(s) if s.success() => Outcome::Succeeded,
                Ok(_) => Outcome::Failed,
                Err(e) => {
                    warn!(job = %dispatch.job, error = %e, "waiting for job process failed");
                    Outcome::Failed
                }
            };
            let elapsed = started.elapsed();
            info!(
                job = %dispatch.job,
                slot = dispatch.slot,
                exit_code = ?status.as_ref().ok().and_then(|s| s.code()),
                ?outcome,
                elapsed_ms = elapsed.as_millis() as u64,
                "job process exited"
            );

            let _ = runtime_tx
                .send(RuntimeEvent::JobCompleted {
                    slot: dispatch.slot,
                    job: dispatch.job,
                    outcome,
                    elapsed,
                })
                .await;
        }

        cancel = &mut cancel_rx => {
            if cancel.is_ok() {
                info!(job = %dispatch.job, slot = dispatch.slot, "terminating running job");
                if let Err(e) = child.kill().await {
                    warn!(job = %dispatch.job, error = %e, "failed to kill job process");
                }
            } else {
                // Child will be killed on drop due to kill_on_drop(true).
                debug!(job = %dispatch.job, "cancel channel closed");
            }
        }
    }
}

/// Absolute path handed to the command for `job`.
pub fn job_path(jobs_dir: &Path, job: &str) -> PathBuf {
    jobs_dir.join(job)
}
