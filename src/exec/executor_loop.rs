// src/exec/executor_loop.rs

//! Background loop that owns the running job processes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::exec::job_runner::run_job;
use crate::scheduler::Dispatch;

/// How long to wait for killed processes to be reaped.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests accepted by the executor loop.
#[derive(Debug)]
pub enum ExecutorCommand {
    Start(Dispatch),
    /// Kill every running job; reply once they are gone.
    TerminateAll(oneshot::Sender<()>),
}

/// Internal handle for a currently-running job process.
struct ActiveJob {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Spawn the background executor loop.
///
/// Each started job runs in its own Tokio task so slots never wait on each
/// other. There is at most one process per slot index.
pub fn spawn_executor(
    program: PathBuf,
    jobs_dir: PathBuf,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<ExecutorCommand> {
    let (tx, mut rx) = mpsc::channel::<ExecutorCommand>(64);

    tokio::spawn(async move {
        info!(program = ?program, "executor loop started");

        let mut active: HashMap<usize, ActiveJob> = HashMap::new();

        while let Some(command) = rx.recv().await {
            active.retain(|_, job| !job.handle.is_finished());

            match command {
                ExecutorCommand::Start(dispatch) => {
                    if active.contains_key(&dispatch.slot) {
                        // The previous occupant reported completion but its
                        // task hasn't returned yet.
                        debug!(slot = dispatch.slot, job = %dispatch.job, "reusing slot");
                    }
                    let slot = dispatch.slot;
                    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
                    let handle = tokio::spawn(run_job(
                        program.clone(),
                        jobs_dir.clone(),
                        dispatch,
                        runtime_tx.clone(),
                        cancel_rx,
                    ));
                    active.insert(
                        slot,
                        ActiveJob {
                            cancel: Some(cancel_tx),
                            handle,
                        },
                    );
                }
                ExecutorCommand::TerminateAll(done) => {
                    terminate_all(&mut active).await;
                    let _ = done.send(());
                }
            }
        }

        // Runtime dropped the sender: make sure nothing outlives us.
        terminate_all(&mut active).await;
        info!("executor loop finished (channel closed)");
    });

    tx
}

async fn terminate_all(active: &mut HashMap<usize, ActiveJob>) {
    if active.is_empty() {
        return;
    }
    info!(count = active.len(), "terminating running jobs");

    for (slot, job) in active.iter_mut() {
        if let Some(cancel) = job.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(slot, "job already finished while cancelling");
            }
        }
    }
    for (slot, job) in active.drain() {
        if tokio::time::timeout(REAP_TIMEOUT, job.handle).await.is_err() {
            warn!(slot, "job process did not exit after kill");
        }
    }
}
