// src/scheduler/mod.rs

//! Job scheduler: pending queue, slot assignment, retry policy and counters.
//!
//! The scheduler is a plain synchronous state object. It never spawns, sleeps
//! or writes; the engine calls its operations one at a time, which is what
//! serializes every mutation of the scheduling state.

pub mod job;
pub mod slots;

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::{JobId, Outcome};
use crate::state_log::Replay;
use crate::types::AttemptLimit;

pub use job::{CompletionEffect, Dispatch, JobRecord, JobState};
pub use slots::{SlotEntry, SlotTable};

/// Snapshot of the scheduler counters, used by the status layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Occupied slots.
    pub running: usize,
    /// Desired concurrency.
    pub desired: usize,
    /// Jobs waiting in the pending queue.
    pub pending: usize,
    /// Terminal successes, replayed ones included.
    pub succeeded: usize,
    /// Terminal failures.
    pub failed: usize,
    /// Size of the known-ids set.
    pub known: usize,
    /// Attempts completed during this process run.
    pub attempts: u64,
}

impl SchedulerStats {
    /// Jobs in a terminal state.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Known jobs not yet terminal.
    pub fn remaining(&self) -> usize {
        self.known.saturating_sub(self.completed())
    }
}

#[derive(Debug)]
pub struct Scheduler {
    desired: usize,
    attempt_limit: AttemptLimit,
    pending: VecDeque<JobId>,
    /// Every id ever discovered or replayed as succeeded. Only grows.
    known: HashSet<JobId>,
    /// Pending, running and terminal-failed jobs. Succeeded jobs are dropped.
    records: HashMap<JobId, JobRecord>,
    slots: SlotTable,
    /// Failed attempts replayed from the log, consumed on first discovery.
    prior_attempts: HashMap<JobId, u32>,
    succeeded: usize,
    failed: usize,
    attempts: u64,
}

impl Scheduler {
    pub fn new(desired: usize, attempt_limit: AttemptLimit) -> Self {
        Self {
            desired,
            attempt_limit,
            pending: VecDeque::new(),
            known: HashSet::new(),
            records: HashMap::new(),
            slots: SlotTable::new(),
            prior_attempts: HashMap::new(),
            succeeded: 0,
            failed: 0,
            attempts: 0,
        }
    }

    /// Seed state from a replayed log.
    ///
    /// Succeeded ids become known (and are never enqueued); failure counts of
    /// the others are remembered so the attempt limit spans restarts.
    pub fn restore(&mut self, replay: &Replay) {
        for id in replay.succeeded() {
            if self.known.insert(id.clone()) {
                self.succeeded += 1;
            }
        }
        for (id, attempts) in replay.failed_attempts() {
            if !self.known.contains(id) {
                self.prior_attempts.insert(id.clone(), attempts);
            }
        }
        info!(
            succeeded = self.succeeded,
            with_failures = self.prior_attempts.len(),
            "restored scheduler state from log"
        );
    }

    pub fn desired(&self) -> usize {
        self.desired
    }

    pub fn running(&self) -> usize {
        self.slots.occupied()
    }

    /// True when nothing is queued and nothing is running.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.slots.occupied() == 0
    }

    pub fn known_ids(&self) -> &HashSet<JobId> {
        &self.known
    }

    /// Current state of a known job.
    pub fn state_of(&self, id: &str) -> Option<JobState> {
        match self.records.get(id) {
            Some(record) => Some(record.state),
            None if self.known.contains(id) => Some(JobState::Succeeded),
            None => None,
        }
    }

    /// Pending queue in dispatch order.
    pub fn pending(&self) -> impl Iterator<Item = &JobId> {
        self.pending.iter()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            running: self.slots.occupied(),
            desired: self.desired,
            pending: self.pending.len(),
            succeeded: self.succeeded,
            failed: self.failed,
            known: self.known.len(),
            attempts: self.attempts,
        }
    }

    /// Add newly discovered ids to the tail of the pending queue.
    ///
    /// Ids already known (replayed, queued, running or terminal) are skipped.
    /// Returns the number of ids that were new.
    pub fn ingest<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = JobId>,
    {
        let mut added = 0;
        for id in ids {
            if !self.known.insert(id.clone()) {
                continue;
            }
            added += 1;

            let attempts = self.prior_attempts.remove(&id).unwrap_or(0);
            let mut record = JobRecord::new(id.clone(), attempts);

            if self.attempt_limit.is_exhausted(attempts) {
                warn!(job = %id, attempts, "attempts already exhausted in log; not retrying");
                record.state = JobState::Failed;
                self.failed += 1;
            } else {
                self.pending.push_back(id.clone());
            }
            self.records.insert(id, record);
        }
        if added > 0 {
            debug!(added, pending = self.pending.len(), "ingested new jobs");
        }
        added
    }

    /// Fill free capacity from the head of the pending queue.
    ///
    /// Occupied slots never exceed desired concurrency through this call;
    /// after a decrease it simply dispatches nothing until enough running
    /// jobs have finished.
    pub fn tick(&mut self, now: Instant) -> Vec<Dispatch> {
        let mut dispatched = Vec::new();

        while self.slots.occupied() < self.desired {
            let Some(id) = self.pending.pop_front() else {
                break;
            };
            let Some(record) = self.records.get_mut(&id) else {
                warn!(job = %id, "pending job without record; dropping");
                continue;
            };

            record.state = JobState::Running;
            let attempt = record.attempts + 1;
            let slot = self.slots.occupy(id.clone(), now);

            debug!(job = %id, slot, attempt, "dispatching job");
            dispatched.push(Dispatch {
                slot,
                job: id,
                attempt,
            });
        }

        dispatched
    }

    /// Apply the outcome reported by `slot` for `job`.
    ///
    /// Returns `None` (and changes nothing) when the slot is not running that
    /// job, e.g. a late report after the slot was already released.
    pub fn on_completion(
        &mut self,
        slot: usize,
        job: &str,
        outcome: Outcome,
    ) -> Option<CompletionEffect> {
        let Some(entry) = self.slots.release(slot, job) else {
            warn!(job, slot, "completion for a slot that is not running this job; ignoring");
            return None;
        };
        self.attempts += 1;

        let effect = match outcome {
            Outcome::Succeeded => {
                self.records.remove(job);
                self.succeeded += 1;
                CompletionEffect::Succeeded
            }
            Outcome::Failed => {
                let record = self.records.get_mut(job)?;
                record.attempts += 1;
                let attempts = record.attempts;
                if self.attempt_limit.is_exhausted(attempts) {
                    record.state = JobState::Failed;
                    self.failed += 1;
                    CompletionEffect::Exhausted { attempts }
                } else {
                    record.state = JobState::Pending;
                    self.pending.push_back(job.to_string());
                    CompletionEffect::Requeued { attempts }
                }
            }
        };

        debug!(job, slot, ?effect, held_for = ?entry.started.elapsed(), "applied completion");
        Some(effect)
    }

    /// Set desired concurrency to `max(0, n)` and return the new value.
    ///
    /// Running jobs are never preempted; a lower target only throttles later
    /// `tick` calls.
    pub fn set_concurrency(&mut self, n: i64) -> usize {
        self.desired = usize::try_from(n.max(0)).unwrap_or(usize::MAX);
        info!(desired = self.desired, running = self.running(), "desired concurrency changed");
        self.desired
    }
}
