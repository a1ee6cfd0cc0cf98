// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File,
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    unreadable: HashSet<PathBuf>,
}

/// In-memory filesystem for discovery tests.
///
/// Clones share state, so a test can keep one handle to mutate the tree
/// while the code under test scans through another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        ensure_dir_entry(&mut state.entries, path.as_ref());
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        state.entries.insert(path.clone(), MockEntry::File);

        if let Some(parent) = non_empty_parent(&path) {
            ensure_dir_entry(&mut state.entries, &parent);
            link_child(&mut state.entries, &parent, &path);
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        state.entries.remove(path);
        if let (Some(parent), Some(name)) = (non_empty_parent(path), path.file_name()) {
            if let Some(MockEntry::Dir(children)) = state.entries.get_mut(&parent) {
                let name = name.to_string_lossy();
                children.retain(|c| *c != name);
            }
        }
    }

    /// Make `read_dir` on `path` fail until cleared again.
    pub fn set_unreadable(&self, path: impl AsRef<Path>, unreadable: bool) {
        let mut state = self.state.lock().unwrap();
        let path = path.as_ref().to_path_buf();
        if unreadable {
            state.unreadable.insert(path);
        } else {
            state.unreadable.remove(&path);
        }
    }
}

fn non_empty_parent(path: &Path) -> Option<PathBuf> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        }
    })
}

fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = non_empty_parent(path) {
        if parent != path {
            ensure_dir_entry(entries, &parent);
            link_child(entries, &parent, path);
        }
    }
}

fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let (Some(MockEntry::Dir(children)), Some(name)) =
        (entries.get_mut(parent), child.file_name().and_then(|n| n.to_str()))
    {
        if !children.iter().any(|c| c == name) {
            children.push(name.to_string());
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.state.lock().unwrap().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::File))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        if state.unreadable.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_register_with_their_parent() {
        let fs = MockFileSystem::new();
        fs.add_file("/jobs/a.txt");
        fs.add_file("/jobs/b.txt");

        assert!(fs.is_dir(Path::new("/jobs")));
        assert!(fs.is_file(Path::new("/jobs/a.txt")));
        let mut listed = fs.read_dir(Path::new("/jobs")).unwrap();
        listed.sort();
        assert_eq!(
            listed,
            vec![PathBuf::from("/jobs/a.txt"), PathBuf::from("/jobs/b.txt")]
        );
    }

    #[test]
    fn removed_and_unreadable_entries() {
        let fs = MockFileSystem::new();
        fs.add_file("/jobs/a.txt");
        fs.remove("/jobs/a.txt");
        assert!(fs.read_dir(Path::new("/jobs")).unwrap().is_empty());

        fs.set_unreadable("/jobs", true);
        assert!(fs.read_dir(Path::new("/jobs")).is_err());
        fs.set_unreadable("/jobs", false);
        assert!(fs.read_dir(Path::new("/jobs")).is_ok());
    }
}
