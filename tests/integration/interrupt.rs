//! Runs the real binary in its own process group and interrupts it the way a
//! terminal Ctrl-C does: SIGINT to every process in the foreground group.

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use runner::state_log::log_path_for;

const DEADLINE: Duration = Duration::from_secs(20);

fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let start = Instant::now();
    while !cond() {
        assert!(start.elapsed() < DEADLINE, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn group_sigint_lets_running_jobs_finish() {
    let jobs = tempfile::tempdir().unwrap();
    let marks = tempfile::tempdir().unwrap();

    // Each job is a shell script: note that it started, then take a while.
    for name in ["a", "b", "c"] {
        let body = format!("touch \"$RUNNER_TEST_MARKS/{name}\"\nsleep 2\n");
        std::fs::write(jobs.path().join(name), body).unwrap();
    }

    let mut child = Command::new(env!("CARGO_BIN_EXE_runner"))
        .args(["-j", "2", "--max-attempts", "1", "--no-watch", "sh"])
        .arg(jobs.path())
        .env("RUNNER_TEST_MARKS", marks.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .process_group(0)
        .spawn()
        .unwrap();
    let pgid = child.id() as libc::pid_t;

    let started = |name: &str| marks.path().join(name).exists();
    wait_for("both slots to start", || started("a") && started("b"));

    let rc = unsafe { libc::kill(-pgid, libc::SIGINT) };
    assert_eq!(rc, 0, "kill: {}", std::io::Error::last_os_error());

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if start.elapsed() > DEADLINE {
            let _ = child.kill();
            panic!("runner did not exit after SIGINT");
        }
        thread::sleep(Duration::from_millis(20));
    };
    assert!(status.success(), "runner exited with {status}");

    let log = std::fs::read_to_string(log_path_for(jobs.path(), Path::new("sh"))).unwrap();
    let mut done: Vec<&str> = log
        .lines()
        .filter(|l| l.contains(" done "))
        .filter_map(|l| l.split(' ').next_back())
        .collect();
    done.sort_unstable();
    assert_eq!(done, ["a", "b"], "log:\n{log}");
    assert!(!log.contains(" failed "), "log:\n{log}");
    assert!(!started("c"), "no new job starts after the interrupt");
}
