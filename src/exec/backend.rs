// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of spawning processes
//! itself. Starting is non-blocking: the backend reports each finished attempt
//! later as a `RuntimeEvent::JobCompleted` carrying the slot, outcome and
//! elapsed time.
//!
//! - `ProcessExecutor` is the production implementation: it forwards
//!   requests to the loop in [`executor_loop`](super::executor_loop).
//! - Tests provide their own `ExecutorBackend` that decides outcomes without
//!   spawning real processes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};

use crate::engine::RuntimeEvent;
use crate::errors::{Result, RunnerError};
use crate::scheduler::Dispatch;

use super::executor_loop::{spawn_executor, ExecutorCommand};

/// Trait abstracting how dispatched jobs are executed.
pub trait ExecutorBackend: Send {
    /// Start each job in its slot and return without waiting for them.
    fn start_jobs(
        &mut self,
        jobs: Vec<Dispatch>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Forcibly stop every running job. Killed jobs report no completion.
    fn terminate_running(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Executes `program <job path>` as a child process per job.
pub struct ProcessExecutor {
    tx: mpsc::Sender<ExecutorCommand>,
}

impl ProcessExecutor {
    /// Spawns the background executor loop immediately.
    pub fn new(program: PathBuf, jobs_dir: PathBuf, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let tx = spawn_executor(program, jobs_dir, runtime_tx);
        Self { tx }
    }
}

fn loop_gone() -> RunnerError {
    RunnerError::Executor("executor loop stopped".to_string())
}

impl ExecutorBackend for ProcessExecutor {
    fn start_jobs(
        &mut self,
        jobs: Vec<Dispatch>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for job in jobs {
                tx.send(ExecutorCommand::Start(job))
                    .await
                    .map_err(|_| loop_gone())?;
            }
            Ok(())
        })
    }

    fn terminate_running(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.tx.clone();

        Box::pin(async move {
            let (done_tx, done_rx) = oneshot::channel();
            tx.send(ExecutorCommand::TerminateAll(done_tx))
                .await
                .map_err(|_| loop_gone())?;
            done_rx.await.map_err(|_| loop_gone())
        })
    }
}
