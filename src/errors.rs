// src/errors.rs

//! Crate-wide error type and helpers.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid task id '{0}' (expected task:<workflowId>:<index>)")]
    InvalidTaskId(String),

    #[error("Task store error: {0}")]
    Store(String),

    #[error("No job message for task {task} within {timeout:?}")]
    NoMessage { task: String, timeout: Duration },

    #[error("Invalid job descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Input files not ready after {rounds} rounds: {missing:?}")]
    InputTimeout { missing: Vec<PathBuf>, rounds: u32 },

    #[error("Failed to spawn '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open job output {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Completion notification failed: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::InvalidDescriptor(err.to_string())
    }
}

impl From<redis::RedisError> for WorkerError {
    fn from(err: redis::RedisError) -> Self {
        WorkerError::Store(err.to_string())
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WorkerError>;
