// src/fs/mod.rs

//! Filesystem port used for input readiness checks and the file audit.

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

pub mod mock;

/// Outcome of looking a path up.
///
/// "Not there" is a normal answer, not an error; only real IO failures
/// (permissions, broken mounts, ...) come back as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Present { size: u64 },
    Missing,
}

impl FileState {
    pub fn is_present(&self) -> bool {
        matches!(self, FileState::Present { .. })
    }
}

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn stat(&self, path: &Path) -> Result<FileState>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> Result<FileState> {
        match fs::metadata(path) {
            Ok(meta) => Ok(FileState::Present { size: meta.len() }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileState::Missing),
            Err(e) => Err(e).with_context(|| format!("checking file {:?}", path)),
        }
    }
}
