use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Builds a temporary job directory.
///
/// ```ignore
/// let dir = JobDirBuilder::new().jobs(["a.txt", "b.txt"]).hidden(".notes").build();
/// ```
#[derive(Debug, Default)]
pub struct JobDirBuilder {
    files: Vec<String>,
    dirs: Vec<String>,
}

impl JobDirBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(mut self, name: &str) -> Self {
        self.files.push(name.to_string());
        self
    }

    pub fn jobs<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.files.extend(names.into_iter().map(str::to_string));
        self
    }

    /// A dot-file; never picked up as a job.
    pub fn hidden(self, name: &str) -> Self {
        assert!(name.starts_with('.'), "hidden files start with '.'");
        self.job(name)
    }

    /// A subdirectory; never picked up as a job.
    pub fn subdir(mut self, name: &str) -> Self {
        self.dirs.push(name.to_string());
        self
    }

    pub fn build(self) -> TempDir {
        let dir = tempfile::tempdir().expect("create temp job dir");
        for name in &self.dirs {
            fs::create_dir(dir.path().join(name)).expect("create subdir");
        }
        for name in &self.files {
            add_job(dir.path(), name);
        }
        dir
    }
}

/// Drop a new job file into an existing directory.
pub fn add_job(dir: &Path, name: &str) {
    fs::write(dir.join(name), name.as_bytes()).expect("write job file");
}
