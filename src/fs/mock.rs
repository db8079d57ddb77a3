// src/fs/mock.rs

use super::{FileState, FileSystem};
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<PathBuf, u64>,
    broken: HashSet<PathBuf>,
    stats: HashMap<PathBuf, usize>,
}

/// In-memory filesystem for tests.
///
/// Files can be added while the code under test is running, and every
/// `stat` call is counted per path.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    inner: Arc<Mutex<Inner>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let size = content.into().len() as u64;
        let mut inner = self.inner.lock().unwrap();
        inner.files.insert(path.as_ref().to_path_buf(), size);
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let mut inner = self.inner.lock().unwrap();
        inner.files.remove(path.as_ref());
    }

    /// Make every later `stat` of `path` fail with an IO-style error.
    pub fn break_path(&self, path: impl AsRef<Path>) {
        let mut inner = self.inner.lock().unwrap();
        inner.broken.insert(path.as_ref().to_path_buf());
    }

    /// How many times `stat` was called for `path`.
    pub fn stat_count(&self, path: impl AsRef<Path>) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.stats.get(path.as_ref()).copied().unwrap_or(0)
    }
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> Result<FileState> {
        let mut inner = self.inner.lock().unwrap();
        *inner.stats.entry(path.to_path_buf()).or_insert(0) += 1;

        if inner.broken.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }

        Ok(match inner.files.get(path) {
            Some(size) => FileState::Present { size: *size },
            None => FileState::Missing,
        })
    }
}
