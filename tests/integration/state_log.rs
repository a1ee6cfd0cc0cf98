use std::time::Duration;

use runner::engine::Outcome;
use runner::errors::RunnerError;
use runner::state_log::{LogEntry, OutcomeLog, Replay, StateLog};

fn entry(job: &str, outcome: Outcome) -> LogEntry {
    LogEntry::new(job.to_string(), outcome, Duration::from_millis(120))
}

#[tokio::test]
async fn replay_after_reopen_reflects_latest_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".tool.log");

    let (mut log, _) = StateLog::open(&path).await.unwrap();
    log.append(entry("a", Outcome::Failed)).await.unwrap();
    log.append(entry("b", Outcome::Succeeded)).await.unwrap();
    log.append(entry("a", Outcome::Succeeded)).await.unwrap();
    log.append(entry("c", Outcome::Failed)).await.unwrap();
    drop(log);

    let (_, replay) = StateLog::open(&path).await.unwrap();
    let mut done: Vec<_> = replay.succeeded().cloned().collect();
    done.sort();
    assert_eq!(done, ["a", "b"]);
    assert_eq!(replay.outcome_of("c"), Some(Outcome::Failed));

    let failed: Vec<_> = replay.failed_attempts().map(|(id, n)| (id.clone(), n)).collect();
    assert_eq!(failed, [("c".to_string(), 1)]);
    assert_eq!(replay.mean_duration(), Some(Duration::from_millis(120)));
}

#[tokio::test]
async fn job_ids_with_spaces_survive_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".tool.log");

    let (mut log, _) = StateLog::open(&path).await.unwrap();
    log.append(entry("holiday photo 01.png", Outcome::Succeeded)).await.unwrap();
    drop(log);

    let (_, replay) = StateLog::open(&path).await.unwrap();
    assert_eq!(replay.outcome_of("holiday photo 01.png"), Some(Outcome::Succeeded));
}

#[tokio::test]
async fn corrupt_complete_line_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".tool.log");
    std::fs::write(&path, "2026-10-16T09:00:00Z done 5 a\nnot a log line\n").unwrap();

    let err = StateLog::open(&path).await.unwrap_err();
    assert!(matches!(err, RunnerError::LogCorrupt { line: 2, .. }), "got {err:?}");
}

#[test]
fn torn_tail_is_ignored_by_replay() {
    let bytes = b"2026-10-16T09:00:00Z done 5 a\n2026-10-16T09:00:01Z failed 7 b";
    let replay = Replay::from_bytes(bytes).unwrap();

    assert!(replay.had_torn_tail());
    assert_eq!(replay.entries(), 1);
    assert_eq!(replay.outcome_of("b"), None);
}
