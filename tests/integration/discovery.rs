use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use runner::engine::RuntimeEvent;
use runner::fs::RealFileSystem;
use runner::jobs::{spawn_dir_watcher, spawn_scanner, JobSource};
use runner_test_utils::builders::add_job;
use runner_test_utils::{with_timeout, JobDirBuilder};

#[test]
fn real_directory_listing_skips_hidden_files_and_subdirs() {
    let dir = JobDirBuilder::new()
        .jobs(["b.txt", "a.txt", "notes.md"])
        .hidden(".runner.log")
        .subdir("nested.txt")
        .build();

    let source = JobSource::new(Arc::new(RealFileSystem), dir.path(), "*.txt").unwrap();
    let ids = source.discover(&HashSet::new()).unwrap();
    assert_eq!(ids, ["a.txt", "b.txt"]);
}

#[tokio::test]
async fn files_added_mid_run_are_reported_by_the_next_scan() {
    let dir = JobDirBuilder::new().job("a").build();
    let source = JobSource::new(Arc::new(RealFileSystem), dir.path(), "*").unwrap();
    let known: HashSet<String> = ["a".to_string()].into_iter().collect();
    let (tx, mut rx) = mpsc::channel(16);

    let scanner = spawn_scanner(source, Duration::from_secs(1), known, tx, None);
    add_job(dir.path(), "f");
    add_job(dir.path(), "g");

    let mut seen = Vec::new();
    with_timeout(async {
        while seen.len() < 2 {
            match rx.recv().await {
                Some(RuntimeEvent::JobsDiscovered { jobs }) => seen.extend(jobs),
                other => panic!("unexpected {other:?}"),
            }
        }
    })
    .await;
    scanner.abort();

    seen.sort();
    assert_eq!(seen, ["f", "g"]);
}

#[tokio::test]
async fn watcher_nudges_on_new_files() {
    let dir = JobDirBuilder::new().build();
    let (_watcher, mut nudges) = spawn_dir_watcher(dir.path()).unwrap();

    add_job(dir.path(), "new-job");

    with_timeout(nudges.recv()).await.expect("watcher still alive");
}
