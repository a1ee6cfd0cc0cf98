// src/state_log/mod.rs

//! Append-only, durable record of job outcomes.
//!
//! - [`codec`] defines [`LogEntry`] and its one-line text form.
//! - [`replay`] folds an existing log into a [`Replay`] at startup.
//! - [`StateLog`] is the file-backed [`OutcomeLog`] used in production.
//!
//! An outcome counts as committed only once `append` has returned `Ok`, which
//! happens after the line has been written and `fsync`ed.

pub mod codec;
pub mod replay;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::errors::{Result, RunnerError};

pub use codec::{encode_line, parse_line, LogEntry};
pub use replay::Replay;

/// Sink for completed attempts.
///
/// Production uses [`StateLog`]; tests can substitute an in-memory log, or
/// one that fails on demand.
pub trait OutcomeLog: Send {
    /// Durably record `entry`. Must not return `Ok` before the entry would
    /// survive a crash.
    fn append(
        &mut self,
        entry: LogEntry,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Deterministic log location for a command/job-directory pair:
/// `<jobs_dir>/.<command basename>.log`.
pub fn log_path_for(jobs_dir: &Path, command: &Path) -> PathBuf {
    let name = command
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "runner".to_string());
    jobs_dir.join(format!(".{name}.log"))
}

/// File-backed state log.
#[derive(Debug)]
pub struct StateLog {
    path: PathBuf,
    file: File,
}

impl StateLog {
    /// Replay the log at `path`, then open it for appending.
    ///
    /// A torn trailing entry is cut off the file so that the next append
    /// starts on a fresh line.
    pub async fn open(path: impl Into<PathBuf>) -> Result<(Self, Replay)> {
        let path = path.into();
        let replay = Replay::load(&path).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let len = file.metadata().await?.len();
        if len > replay.valid_len() {
            warn!(
                ?path,
                from = len,
                to = replay.valid_len(),
                "truncating torn tail of state log"
            );
            file.set_len(replay.valid_len()).await?;
            file.sync_all().await?;
        }

        info!(?path, entries = replay.entries(), "state log opened");
        Ok((Self { path, file }, replay))
    }

    async fn write_entry(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = encode_line(entry);
        self.file.write_all(line.as_bytes()).await?;
        self.file.flush().await?;
        self.file.sync_data().await
    }
}

impl OutcomeLog for StateLog {
    fn append(
        &mut self,
        entry: LogEntry,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if let Err(e) = self.write_entry(&entry).await {
                error!(path = ?self.path, job = %entry.job, error = %e, "state log append failed");
                return Err(RunnerError::LogWrite(e));
            }
            debug!(job = %entry.job, outcome = ?entry.outcome, "log entry committed");
            Ok(())
        })
    }
}
