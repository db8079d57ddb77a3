// src/types.rs

//! Identifier types shared across the worker.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Deserialize;

use crate::errors::WorkerError;

/// Exit code of a job process. `-1` stands for "no exit code" (killed by a
/// signal, or the program could not be started).
pub type ExitCode = i32;

/// Identifier of a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task identifier of the form `task:<workflowId>:<index>`.
///
/// The workflow id may itself contain `:`; the index is always the last
/// segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId {
    raw: String,
    workflow: WorkflowId,
    index: u64,
}

impl TaskId {
    pub fn workflow(&self) -> &WorkflowId {
        &self.workflow
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Form usable inside file names (`:` is not portable).
    pub fn file_stem(&self) -> String {
        self.raw.replace(':', "_")
    }
}

impl FromStr for TaskId {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WorkerError::InvalidTaskId(s.to_string());

        let rest = s.strip_prefix("task:").ok_or_else(invalid)?;
        let (workflow, index) = rest.rsplit_once(':').ok_or_else(invalid)?;
        if workflow.is_empty() {
            return Err(invalid());
        }
        let index: u64 = index.parse().map_err(|_| invalid())?;

        Ok(TaskId {
            raw: s.to_string(),
            workflow: WorkflowId(workflow.to_string()),
            index,
        })
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Identity of this worker process, used to keep log files of concurrent
/// handlers of the same task apart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `<pid>-<8 hex digits>`.
    pub fn generate() -> Self {
        let suffix: u32 = rand::thread_rng().r#gen();
        Self(format!("{}-{:08x}", std::process::id(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
