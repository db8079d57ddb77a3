// src/job/descriptor.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, WorkerError};

/// One entry of an input or output manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: PathBuf,
}

/// Job description exactly as it travels through the task store.
///
/// ```json
/// {
///   "name": "mProject",
///   "executable": "mProject",
///   "args": ["-X", "in.fits", "out.fits"],
///   "stdout": "mProject.out",
///   "inputs": [{ "name": "in.fits" }],
///   "outputs": [{ "name": "out.fits" }]
/// }
/// ```
///
/// Unknown fields are ignored. Use [`JobDescriptor::try_from`] (or
/// [`JobDescriptor::parse`]) to get a validated descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJobDescriptor {
    #[serde(default)]
    pub name: String,
    pub executable: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout_append: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_append: Option<PathBuf>,
    #[serde(default)]
    pub inputs: Vec<FileRef>,
    #[serde(default)]
    pub outputs: Vec<FileRef>,
}

/// Where a job stream is redirected in addition to the task's log sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// `stdout` / `stderr`: truncated on the first attempt.
    Truncate(PathBuf),
    /// `stdoutAppend` / `stderrAppend`: always appended to.
    Append(PathBuf),
}

impl OutputTarget {
    pub fn path(&self) -> &PathBuf {
        match self {
            OutputTarget::Truncate(p) | OutputTarget::Append(p) => p,
        }
    }
}

/// Validated, immutable job descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub name: String,
    pub executable: String,
    pub args: Vec<String>,
    pub stdout: Option<OutputTarget>,
    pub stderr: Option<OutputTarget>,
    pub inputs: Vec<FileRef>,
    pub outputs: Vec<FileRef>,
}

impl JobDescriptor {
    /// Parse and validate a JSON payload.
    pub fn parse(payload: &str) -> Result<Self> {
        let raw: RawJobDescriptor = serde_json::from_str(payload)?;
        JobDescriptor::try_from(raw)
    }

    pub fn input_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.inputs.iter().map(|f| &f.name)
    }

    pub fn output_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.outputs.iter().map(|f| &f.name)
    }
}

impl TryFrom<RawJobDescriptor> for JobDescriptor {
    type Error = WorkerError;

    fn try_from(raw: RawJobDescriptor) -> std::result::Result<Self, Self::Error> {
        if raw.executable.trim().is_empty() {
            return Err(WorkerError::InvalidDescriptor(
                "`executable` must not be empty".to_string(),
            ));
        }

        let stdout = redirect("stdout", raw.stdout, raw.stdout_append)?;
        let stderr = redirect("stderr", raw.stderr, raw.stderr_append)?;

        for file in raw.inputs.iter().chain(raw.outputs.iter()) {
            if file.name.as_os_str().is_empty() {
                return Err(WorkerError::InvalidDescriptor(
                    "input/output entries must have a non-empty `name`".to_string(),
                ));
            }
        }

        let name = if raw.name.is_empty() {
            raw.executable.clone()
        } else {
            raw.name
        };

        Ok(JobDescriptor {
            name,
            executable: raw.executable,
            args: raw.args,
            stdout,
            stderr,
            inputs: raw.inputs,
            outputs: raw.outputs,
        })
    }
}

fn redirect(
    stream: &str,
    truncate: Option<PathBuf>,
    append: Option<PathBuf>,
) -> Result<Option<OutputTarget>> {
    match (truncate, append) {
        (Some(_), Some(_)) => Err(WorkerError::InvalidDescriptor(format!(
            "`{stream}` and `{stream}Append` are mutually exclusive"
        ))),
        (Some(p), None) => Ok(Some(OutputTarget::Truncate(p))),
        (None, Some(p)) => Ok(Some(OutputTarget::Append(p))),
        (None, None) => Ok(None),
    }
}
