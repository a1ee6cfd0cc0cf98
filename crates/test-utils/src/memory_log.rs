use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use runner::engine::{JobId, Outcome};
use runner::errors::{Result, RunnerError};
use runner::state_log::{LogEntry, OutcomeLog};

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<LogEntry>,
    /// Appends fail once this many entries exist.
    fail_after: Option<usize>,
}

/// In-memory `OutcomeLog`. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    state: Arc<Mutex<LogState>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` appends, then fail every further one like a full disk.
    pub fn failing_after(n: usize) -> Self {
        let log = Self::new();
        log.state.lock().unwrap().fail_after = Some(n);
        log
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    /// Job ids with an entry of the given outcome, in append order.
    pub fn ids_with(&self, outcome: Outcome) -> Vec<JobId> {
        self.entries()
            .into_iter()
            .filter(|e| e.outcome == outcome)
            .map(|e| e.job)
            .collect()
    }
}

impl OutcomeLog for MemoryLog {
    fn append(
        &mut self,
        entry: LogEntry,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            if guard.fail_after.is_some_and(|n| guard.entries.len() >= n) {
                return Err(RunnerError::LogWrite(io::Error::other("no space left on device")));
            }
            guard.entries.push(entry);
            Ok(())
        })
    }
}
