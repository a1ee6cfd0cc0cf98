// src/jobs/source.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use tracing::{debug, trace};

use crate::engine::JobId;
use crate::fs::FileSystem;

/// Compile a file-name pattern such as `*.png`.
pub fn build_matcher(pattern: &str) -> Result<GlobMatcher> {
    let glob = Glob::new(pattern).with_context(|| format!("invalid file pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Lists the job directory and turns matching files into job ids.
///
/// Only regular files directly inside the directory are jobs. Hidden names
/// (leading `.`) are skipped, which also keeps the state log out of the set.
#[derive(Clone)]
pub struct JobSource {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    pattern: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSource")
            .field("dir", &self.dir)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl JobSource {
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        Ok(Self {
            fs,
            dir: dir.into(),
            pattern: pattern.to_string(),
            matcher: build_matcher(pattern)?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a bare file name is a job under this source's pattern.
    ///
    /// Names with line breaks are skipped: they cannot survive a round trip
    /// through the state log.
    pub fn is_job_name(&self, name: &str) -> bool {
        !name.starts_with('.')
            && !name.contains(['\n', '\r'])
            && self.matcher.is_match(name)
    }

    /// List matching files that are not in `known`, sorted lexicographically.
    ///
    /// Calling this twice on an unchanged directory yields the same ids.
    pub fn discover(&self, known: &HashSet<JobId>) -> Result<Vec<JobId>> {
        let mut found = Vec::new();

        for path in self.fs.read_dir(&self.dir)? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                trace!(?path, "skipping non-UTF-8 file name");
                continue;
            };
            if !self.is_job_name(name) || known.contains(name) {
                continue;
            }
            if !self.fs.is_file(&path) {
                continue;
            }
            found.push(name.to_string());
        }

        found.sort();
        debug!(dir = ?self.dir, new = found.len(), "scanned job directory");
        Ok(found)
    }
}
