// src/exec/audit.rs

//! Input/output file audit logged once a job reached its terminal state.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::fs::{FileState, FileSystem};
use crate::job::JobDescriptor;
use crate::types::TaskId;

/// Size recorded for a declared file that does not exist.
pub const NOT_FOUND_SIZE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Input,
    Output,
}

impl FileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Input => "input",
            FileRole::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAudit {
    pub role: FileRole,
    pub path: PathBuf,
    /// Size in bytes, or [`NOT_FOUND_SIZE`].
    pub size: i64,
}

/// Look up and log the size of every declared input and output.
///
/// Missing files get [`NOT_FOUND_SIZE`]; lookup errors are logged and the
/// file is reported as missing. Never fails.
pub fn audit_files(
    fs: &dyn FileSystem,
    task: &TaskId,
    job: &JobDescriptor,
    input_dir: &Path,
    output_dir: &Path,
) -> Vec<FileAudit> {
    let inputs = job.input_paths().map(|p| (FileRole::Input, input_dir.join(p)));
    let outputs = job.output_paths().map(|p| (FileRole::Output, output_dir.join(p)));

    let audits: Vec<FileAudit> = inputs
        .chain(outputs)
        .map(|(role, path)| {
            let size = match fs.stat(&path) {
                Ok(FileState::Present { size }) => i64::try_from(size).unwrap_or(i64::MAX),
                Ok(FileState::Missing) => NOT_FOUND_SIZE,
                Err(e) => {
                    warn!(task = %task, path = ?path, error = %e, "could not stat file for audit");
                    NOT_FOUND_SIZE
                }
            };
            FileAudit { role, path, size }
        })
        .collect();

    for audit in &audits {
        info!(
            task = %task,
            role = audit.role.as_str(),
            path = ?audit.path,
            size = audit.size,
            "job file"
        );
    }

    audits
}
