// src/state_log/codec.rs

//! Text encoding of log lines.
//!
//! One line per completed attempt:
//!
//! ```text
//! 2026-10-16T09:14:03.512044Z done 1532 frames/0001.png
//! 2026-10-16T09:14:04.001817Z failed 87 frames/0002.png
//! ```
//!
//! The job id is the remainder of the line, so it may contain spaces.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::engine::{JobId, Outcome};

/// One completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub job: JobId,
    pub outcome: Outcome,
    pub elapsed: Duration,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(job: JobId, outcome: Outcome, elapsed: Duration) -> Self {
        Self {
            job,
            outcome,
            elapsed,
            timestamp: Utc::now(),
        }
    }
}

fn outcome_word(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Succeeded => "done",
        Outcome::Failed => "failed",
    }
}

/// Render an entry as a complete, newline-terminated line.
pub fn encode_line(entry: &LogEntry) -> String {
    format!(
        "{} {} {} {}\n",
        entry.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        outcome_word(entry.outcome),
        entry.elapsed.as_millis(),
        entry.job
    )
}

/// Parse one line (without its trailing newline).
pub fn parse_line(line: &str) -> Result<LogEntry, String> {
    let mut parts = line.splitn(4, ' ');
    let (Some(ts), Some(word), Some(ms), Some(job)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected 4 fields in {line:?}"));
    };

    let timestamp = DateTime::parse_from_rfc3339(ts)
        .map_err(|e| format!("bad timestamp {ts:?}: {e}"))?
        .with_timezone(&Utc);
    let outcome = match word {
        "done" => Outcome::Succeeded,
        "failed" => Outcome::Failed,
        other => return Err(format!("unknown outcome {other:?}")),
    };
    let elapsed = ms
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| format!("bad elapsed {ms:?}: {e}"))?;
    if job.is_empty() {
        return Err("empty job id".to_string());
    }

    Ok(LogEntry {
        job: job.to_string(),
        outcome,
        elapsed,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_with_spaces_survive() {
        let entry = LogEntry::new(
            "holiday photos/img 1.jpg".to_string(),
            Outcome::Failed,
            Duration::from_millis(250),
        );
        let line = encode_line(&entry);
        assert!(line.ends_with('\n'));

        let parsed = parse_line(line.trim_end_matches('\n')).unwrap();
        assert_eq!(parsed.job, "holiday photos/img 1.jpg");
        assert_eq!(parsed.outcome, Outcome::Failed);
        assert_eq!(parsed.elapsed, Duration::from_millis(250));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_line("").is_err());
        assert!(parse_line("2026-10-16T09:14:03Z done 12").is_err());
        assert!(parse_line("yesterday done 12 a").is_err());
        assert!(parse_line("2026-10-16T09:14:03Z started 12 a").is_err());
        assert!(parse_line("2026-10-16T09:14:03Z done twelve a").is_err());
    }
}
