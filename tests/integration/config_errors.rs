use clap::Parser;
use runner::cli::CliArgs;
use runner::config::RunnerConfig;
use runner::errors::RunnerError;
use runner_test_utils::JobDirBuilder;

fn config_for(argv: &[&str]) -> Result<RunnerConfig, RunnerError> {
    let mut full = vec!["runner"];
    full.extend_from_slice(argv);
    RunnerConfig::try_from(CliArgs::try_parse_from(full).expect("valid argv"))
}

#[test]
fn missing_job_directory_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = config_for(&["sh", missing.to_str().unwrap()]).unwrap_err();
    assert!(err.is_config(), "got {err:?}");
}

#[test]
fn unknown_command_is_a_configuration_error() {
    let dir = JobDirBuilder::new().job("a").build();

    let err = config_for(&["definitely-not-a-command-xyz", dir.path().to_str().unwrap()])
        .unwrap_err();
    match err {
        RunnerError::Config(msg) => assert!(msg.contains("not found")),
        other => panic!("expected Config error, got {other:?}"),
    }
}

#[test]
fn invalid_pattern_is_a_configuration_error() {
    let dir = JobDirBuilder::new().build();

    let err = config_for(&["sh", dir.path().to_str().unwrap(), "*.{png"]).unwrap_err();
    assert!(err.is_config(), "got {err:?}");
}

#[cfg(unix)]
#[test]
fn log_lives_next_to_the_jobs_and_is_named_after_the_command() {
    let dir = JobDirBuilder::new().build();

    let cfg = config_for(&["sh", dir.path().to_str().unwrap()]).unwrap();
    assert_eq!(cfg.log_path, dir.path().join(".sh.log"));
    assert_eq!(cfg.pattern, "*");
}

#[cfg(unix)]
#[test]
fn non_executable_path_is_rejected() {
    let dir = JobDirBuilder::new().job("script.sh").build();
    let script = dir.path().join("script.sh");

    let err = config_for(&[script.to_str().unwrap(), dir.path().to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("not an executable"), "got {err}");
}
