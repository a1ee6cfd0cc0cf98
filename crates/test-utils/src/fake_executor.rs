use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use runner::engine::{JobId, Outcome, RuntimeEvent};
use runner::errors::{Result, RunnerError};
use runner::exec::ExecutorBackend;
use runner::scheduler::Dispatch;

#[derive(Debug, Default)]
struct FakeState {
    /// Outcomes handed out per job, front first. Empty means success.
    script: HashMap<JobId, VecDeque<Outcome>>,
    started: Vec<Dispatch>,
    /// Started but not yet completed (only in holding mode).
    held: Vec<Dispatch>,
    max_in_flight: usize,
    terminations: usize,
    /// Number of `start_jobs` calls that succeed before every later one errors.
    start_budget: Option<usize>,
}

impl FakeState {
    fn outcome_for(&mut self, job: &str) -> Outcome {
        self.script
            .get_mut(job)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Outcome::Succeeded)
    }
}

/// A fake executor that:
/// - records which jobs were started, in order, with slot and attempt
/// - answers each start with a scripted outcome (success by default)
/// - in holding mode, keeps jobs "running" until the test releases them.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    state: Arc<Mutex<FakeState>>,
    holding: bool,
    elapsed: Duration,
}

/// Test-side view of a [`FakeExecutor`] that has been moved into a runtime.
#[derive(Clone)]
pub struct FakeExecutorHandle {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    state: Arc<Mutex<FakeState>>,
    elapsed: Duration,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            state: Arc::new(Mutex::new(FakeState::default())),
            holding: false,
            elapsed: Duration::from_millis(5),
        }
    }

    /// Answer successive attempts of `job` with these outcomes.
    pub fn with_outcomes(self, job: &str, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.state
            .lock()
            .unwrap()
            .script
            .insert(job.to_string(), outcomes.into_iter().collect());
        self
    }

    /// Don't complete anything until [`FakeExecutorHandle::release`] is called.
    pub fn holding(mut self) -> Self {
        self.holding = true;
        self
    }

    /// Accept `calls` batches of starts, then fail every later one.
    pub fn failing_starts_after(self, calls: usize) -> Self {
        self.state.lock().unwrap().start_budget = Some(calls);
        self
    }

    pub fn handle(&self) -> FakeExecutorHandle {
        FakeExecutorHandle {
            runtime_tx: self.runtime_tx.clone(),
            state: Arc::clone(&self.state),
            elapsed: self.elapsed,
        }
    }
}

fn completion(dispatch: Dispatch, outcome: Outcome, elapsed: Duration) -> RuntimeEvent {
    RuntimeEvent::JobCompleted {
        slot: dispatch.slot,
        job: dispatch.job,
        outcome,
        elapsed,
    }
}

impl ExecutorBackend for FakeExecutor {
    fn start_jobs(
        &mut self,
        jobs: Vec<Dispatch>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let state = Arc::clone(&self.state);
        let holding = self.holding;
        let elapsed = self.elapsed;

        Box::pin(async move {
            let mut completions = Vec::new();
            {
                let mut guard = state.lock().unwrap();
                if let Some(left) = guard.start_budget.as_mut() {
                    if *left == 0 {
                        return Err(RunnerError::Executor(
                            "fake executor refuses to start jobs".to_string(),
                        ));
                    }
                    *left -= 1;
                }
                for dispatch in jobs {
                    guard.started.push(dispatch.clone());
                    if holding {
                        guard.held.push(dispatch);
                        guard.max_in_flight = guard.max_in_flight.max(guard.held.len());
                    } else {
                        let outcome = guard.outcome_for(&dispatch.job);
                        guard.max_in_flight = guard.max_in_flight.max(1);
                        completions.push(completion(dispatch, outcome, elapsed));
                    }
                }
            }

            // Deliver from a separate task: the runtime is the one awaiting us,
            // so sending into its channel here could block on a full buffer.
            if !completions.is_empty() {
                tokio::spawn(async move {
                    for event in completions {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                });
            }
            Ok(())
        })
    }

    fn terminate_running(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            guard.terminations += 1;
            guard.held.clear();
            Ok(())
        })
    }
}

impl FakeExecutorHandle {
    /// Every start, in order.
    pub fn started(&self) -> Vec<Dispatch> {
        self.state.lock().unwrap().started.clone()
    }

    pub fn started_ids(&self) -> Vec<JobId> {
        self.started().into_iter().map(|d| d.job).collect()
    }

    /// Jobs currently held "running".
    pub fn held_ids(&self) -> Vec<JobId> {
        let guard = self.state.lock().unwrap();
        guard.held.iter().map(|d| d.job.clone()).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    pub fn terminations(&self) -> usize {
        self.state.lock().unwrap().terminations
    }

    /// Complete the held job `job` with its scripted outcome.
    ///
    /// Returns false if no such job is held.
    pub async fn release(&self, job: &str) -> bool {
        let event = {
            let mut guard = self.state.lock().unwrap();
            let Some(pos) = guard.held.iter().position(|d| d.job == job) else {
                return false;
            };
            let dispatch = guard.held.remove(pos);
            let outcome = guard.outcome_for(&dispatch.job);
            completion(dispatch, outcome, self.elapsed)
        };
        self.runtime_tx.send(event).await.is_ok()
    }

    /// Complete every held job. Returns how many were released.
    pub async fn release_all(&self) -> usize {
        let mut released = 0;
        for job in self.held_ids() {
            if self.release(&job).await {
                released += 1;
            }
        }
        released
    }
}
