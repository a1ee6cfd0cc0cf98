use clap::Parser;

use runner::cli::CliArgs;
use runner::config::RunnerConfig;
use runner::engine::ExitReason;
use runner::run_with_config;
use runner_test_utils::{init_tracing, with_timeout, JobDirBuilder};

fn config(argv: &[&str]) -> RunnerConfig {
    let mut full = vec!["runner", "--once", "--no-watch"];
    full.extend_from_slice(argv);
    RunnerConfig::try_from(CliArgs::try_parse_from(full).unwrap()).unwrap()
}

#[tokio::test]
async fn succeeding_command_runs_every_job_once() {
    init_tracing();
    let dir = JobDirBuilder::new().jobs(["a", "b", "c"]).build();
    let cfg = config(&["-j", "2", "true", dir.path().to_str().unwrap()]);
    let log_path = cfg.log_path.clone();

    let summary = with_timeout(run_with_config(cfg.clone())).await.unwrap();
    assert_eq!(summary.reason, ExitReason::Completed);
    assert_eq!(summary.stats.succeeded, 3);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(log.lines().filter(|l| l.contains(" done ")).count(), 3);

    // Same arguments again: everything is already done.
    let summary = with_timeout(run_with_config(cfg)).await.unwrap();
    assert_eq!(summary.stats.succeeded, 3);
    assert_eq!(summary.stats.attempts, 0);
    assert_eq!(std::fs::read_to_string(&log_path).unwrap(), log);
}

#[tokio::test]
async fn failing_command_stops_after_max_attempts() {
    init_tracing();
    let dir = JobDirBuilder::new().jobs(["x", "y"]).build();
    let cfg = config(&["--max-attempts", "2", "false", dir.path().to_str().unwrap()]);
    let log_path = cfg.log_path.clone();

    let summary = with_timeout(run_with_config(cfg)).await.unwrap();
    assert_eq!(summary.stats.failed, 2);
    assert_eq!(summary.stats.succeeded, 0);

    let log = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(log.lines().filter(|l| l.contains(" failed ")).count(), 4);
}

#[tokio::test]
async fn only_files_matching_the_pattern_run() {
    init_tracing();
    let dir = JobDirBuilder::new().jobs(["a.png", "b.jpg", "c.png"]).build();
    let cfg = config(&["true", dir.path().to_str().unwrap(), "*.png"]);

    let summary = with_timeout(run_with_config(cfg)).await.unwrap();
    assert_eq!(summary.stats.known, 2);
    assert_eq!(summary.stats.succeeded, 2);
}

#[tokio::test]
async fn command_removed_after_validation_aborts_the_run() {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let dir = JobDirBuilder::new().jobs(["a", "b"]).build();
    let bin = tempfile::tempdir().unwrap();
    let script = bin.path().join("vanishing");
    std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let cfg = config(&[script.to_str().unwrap(), dir.path().to_str().unwrap()]);
    std::fs::remove_file(&script).unwrap();

    let err = with_timeout(run_with_config(cfg)).await.unwrap_err();
    assert!(
        matches!(err, runner::errors::RunnerError::Executor(_)),
        "got {err:?}"
    );
}
