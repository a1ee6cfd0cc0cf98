#![allow(dead_code)]

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use runner::engine::{CoreRuntime, Outcome, RunSummary, Runtime, RuntimeEvent, RuntimeOptions};
use runner::errors::Result;
use runner::scheduler::Scheduler;
use runner::state_log::Replay;
use runner::status::{KeyCommand, MemorySink, StatusReporter};
use runner::types::{AttemptLimit, ConcurrencyFloor};

pub use runner_test_utils::{
    init_tracing, with_timeout, FakeExecutor, FakeExecutorHandle, JobDirBuilder, MemoryLog,
};

/// Sets up a `Runtime` around a `FakeExecutor` and a `MemoryLog`.
pub struct HarnessBuilder {
    desired: usize,
    limit: AttemptLimit,
    floor: ConcurrencyFloor,
    options: RuntimeOptions,
    holding: bool,
    start_budget: Option<usize>,
    scripts: Vec<(String, Vec<Outcome>)>,
    log: MemoryLog,
    replay: Option<Replay>,
}

impl HarnessBuilder {
    pub fn new(desired: usize) -> Self {
        Self {
            desired,
            limit: AttemptLimit::Unbounded,
            floor: ConcurrencyFloor::Zero,
            options: RuntimeOptions {
                status_interval: Duration::from_millis(200),
                ..RuntimeOptions::default()
            },
            holding: false,
            start_budget: None,
            scripts: Vec::new(),
            log: MemoryLog::new(),
            replay: None,
        }
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.limit = AttemptLimit::AtMost(n);
        self
    }

    pub fn floor(mut self, floor: ConcurrencyFloor) -> Self {
        self.floor = floor;
        self
    }

    /// Exit once every known job is terminal.
    pub fn once(mut self) -> Self {
        self.options.exit_when_idle = true;
        self
    }

    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.options.grace_period = grace;
        self
    }

    /// Jobs stay running until the test releases them.
    pub fn holding(mut self) -> Self {
        self.holding = true;
        self
    }

    /// The executor errors on every batch of starts after the first `calls`.
    pub fn failing_starts_after(mut self, calls: usize) -> Self {
        self.start_budget = Some(calls);
        self
    }

    pub fn outcomes(mut self, job: &str, outcomes: &[Outcome]) -> Self {
        self.scripts.push((job.to_string(), outcomes.to_vec()));
        self
    }

    pub fn log(mut self, log: MemoryLog) -> Self {
        self.log = log;
        self
    }

    /// Restore the scheduler from a replayed state log before starting.
    pub fn replay(mut self, replay: Replay) -> Self {
        self.replay = Some(replay);
        self
    }

    /// Spawn the runtime with `initial` as the startup scan result.
    pub fn start(self, initial: &[&str]) -> Harness {
        init_tracing();

        let (tx, rx) = mpsc::channel::<RuntimeEvent>(1024);

        let mut executor = FakeExecutor::new(tx.clone());
        for (job, outcomes) in self.scripts {
            executor = executor.with_outcomes(&job, outcomes);
        }
        if self.holding {
            executor = executor.holding();
        }
        if let Some(calls) = self.start_budget {
            executor = executor.failing_starts_after(calls);
        }
        let executor_handle = executor.handle();

        let mut scheduler = Scheduler::new(self.desired, self.limit);
        if let Some(replay) = &self.replay {
            scheduler.restore(replay);
        }

        let sink = MemorySink::new();
        let reporter = StatusReporter::new(Box::new(sink.clone()), Instant::now());
        let core = CoreRuntime::new(scheduler, self.options, self.floor);

        tx.try_send(RuntimeEvent::JobsDiscovered { jobs: ids(initial) })
            .expect("seed startup scan");

        let runtime = Runtime::new(core, rx, tx.clone(), executor, self.log.clone(), reporter);
        let task = tokio::spawn(runtime.run());

        Harness {
            tx,
            executor: executor_handle,
            log: self.log,
            sink,
            task,
        }
    }
}

pub struct Harness {
    pub tx: mpsc::Sender<RuntimeEvent>,
    pub executor: FakeExecutorHandle,
    pub log: MemoryLog,
    pub sink: MemorySink,
    pub task: JoinHandle<Result<RunSummary>>,
}

impl Harness {
    pub async fn send(&self, event: RuntimeEvent) {
        self.tx.send(event).await.expect("runtime gone");
    }

    pub async fn discover(&self, names: &[&str]) {
        self.send(RuntimeEvent::JobsDiscovered { jobs: ids(names) })
            .await;
    }

    pub async fn key(&self, key: KeyCommand) {
        self.send(RuntimeEvent::Key(key)).await;
    }

    pub async fn interrupt(&self) {
        self.send(RuntimeEvent::ShutdownRequested).await;
    }

    /// Whether any status line emitted so far contains `needle`.
    pub fn status_shows(&self, needle: &str) -> bool {
        self.sink.lines().iter().any(|line| line.contains(needle))
    }

    /// Wait until the runtime has rendered a status line containing `needle`.
    pub async fn wait_for_status(&self, needle: &str) {
        wait_until(|| self.status_shows(needle)).await;
    }

    pub async fn wait_for_held(&self, n: usize) {
        wait_until(|| self.executor.held_ids().len() == n).await;
    }

    /// Keep releasing held jobs until the runtime stops.
    pub async fn release_until_done(self) -> Result<RunSummary> {
        with_timeout(async {
            while !self.task.is_finished() {
                self.executor.release_all().await;
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        self.finish().await
    }

    pub async fn finish(self) -> Result<RunSummary> {
        with_timeout(self.task).await.expect("runtime task panicked")
    }
}

pub fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Poll `cond` until it holds (fails the test after 5 s).
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    with_timeout(async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
}

