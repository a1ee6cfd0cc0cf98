// src/state_log/replay.rs

//! Startup replay of the state log.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::{JobId, Outcome};
use crate::errors::{Result, RunnerError};
use crate::state_log::codec::parse_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Folded {
    last: Outcome,
    /// Failures since the most recent success.
    failures: u32,
}

/// Completion state reconstructed from the log.
#[derive(Debug, Default, Clone)]
pub struct Replay {
    jobs: HashMap<JobId, Folded>,
    /// Elapsed time of every successful attempt, in write order.
    durations: Vec<Duration>,
    entries: usize,
    /// Byte length of the prefix made of complete lines.
    valid_len: u64,
    torn_tail: bool,
}

impl Replay {
    /// Read and fold the log at `path`. A missing file is an empty log.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Self::from_bytes(&bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "no state log yet");
                Ok(Self::default())
            }
            Err(e) => Err(RunnerError::Io(e)),
        }
    }

    /// Fold raw log contents.
    ///
    /// A trailing segment without a newline is a torn write and is dropped.
    /// Any complete line that fails to parse is `LogCorrupt`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut replay = Self::default();
        let mut offset = 0usize;

        for (index, raw) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
            let line_no = index + 1;
            let Some(body) = raw.strip_suffix(b"\n") else {
                warn!(line = line_no, bytes = raw.len(), "discarding torn trailing log entry");
                replay.torn_tail = true;
                break;
            };
            offset += raw.len();

            let text = std::str::from_utf8(body).map_err(|e| RunnerError::LogCorrupt {
                line: line_no,
                reason: e.to_string(),
            })?;
            let text = text.trim_end_matches('\r');
            if text.trim().is_empty() {
                continue;
            }

            let entry = parse_line(text).map_err(|reason| RunnerError::LogCorrupt {
                line: line_no,
                reason,
            })?;
            replay.apply(entry.job, entry.outcome, entry.elapsed);
        }

        replay.valid_len = offset as u64;
        Ok(replay)
    }

    fn apply(&mut self, job: JobId, outcome: Outcome, elapsed: Duration) {
        self.entries += 1;
        let folded = self.jobs.entry(job).or_insert(Folded {
            last: outcome,
            failures: 0,
        });
        folded.last = outcome;
        match outcome {
            Outcome::Succeeded => {
                folded.failures = 0;
                self.durations.push(elapsed);
            }
            Outcome::Failed => folded.failures += 1,
        }
    }

    /// Last recorded outcome of `job`.
    pub fn outcome_of(&self, job: &str) -> Option<Outcome> {
        self.jobs.get(job).map(|f| f.last)
    }

    /// Ids whose most recent entry is a success.
    pub fn succeeded(&self) -> impl Iterator<Item = &JobId> {
        self.jobs
            .iter()
            .filter(|(_, f)| f.last == Outcome::Succeeded)
            .map(|(id, _)| id)
    }

    /// Ids whose most recent entry is a failure, with their failure count.
    pub fn failed_attempts(&self) -> impl Iterator<Item = (&JobId, u32)> {
        self.jobs
            .iter()
            .filter(|(_, f)| f.last == Outcome::Failed)
            .map(|(id, f)| (id, f.failures))
    }

    /// Mean duration of successful attempts, if any were logged.
    pub fn mean_duration(&self) -> Option<Duration> {
        let n = u32::try_from(self.durations.len()).ok().filter(|n| *n > 0)?;
        Some(self.durations.iter().sum::<Duration>() / n)
    }

    /// Number of entries folded.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn valid_len(&self) -> u64 {
        self.valid_len
    }

    /// Whether a partial trailing entry was discarded.
    pub fn had_torn_tail(&self) -> bool {
        self.torn_tail
    }
}
