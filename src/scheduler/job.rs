// src/scheduler/job.rs

//! Per-job bookkeeping owned by the scheduler.

use crate::engine::JobId;

/// Lifecycle of a job inside one process run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Waiting in the pending queue.
    Pending,
    /// Occupying a slot; the executor owns the process.
    Running,
    /// Terminal success.
    Succeeded,
    /// Terminal failure (attempts exhausted).
    Failed,
}

/// What the scheduler knows about one non-succeeded job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: JobId,
    pub state: JobState,
    /// Failed attempts so far (including ones replayed from the log).
    pub attempts: u32,
}

impl JobRecord {
    pub fn new(id: JobId, attempts: u32) -> Self {
        Self {
            id,
            state: JobState::Pending,
            attempts,
        }
    }
}

/// A job the scheduler wants the executor to start now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub slot: usize,
    pub job: JobId,
    /// 1-based attempt number of this execution.
    pub attempt: u32,
}

/// Result of applying one completion to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEffect {
    /// Job reached terminal success.
    Succeeded,
    /// Job failed and went back to the tail of the pending queue.
    Requeued { attempts: u32 },
    /// Job failed and has no attempts left.
    Exhausted { attempts: u32 },
}

impl CompletionEffect {
    /// Whether this completion moved the job into a terminal state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, CompletionEffect::Requeued { .. })
    }
}
