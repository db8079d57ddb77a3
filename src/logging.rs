// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for the level filter:
//! 1. `RUST_LOG`, when set, as a full filter directive
//! 2. the configured `LOG_LEVEL`
//!
//! Events go to STDERR and, when a trace file is given, to that file as
//! well. Job stdout/stderr never pass through here; they are captured into
//! their own files (see [`TaskLogPaths`]).

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;
use crate::types::{InstanceId, TaskId};

/// Per-task log outputs, all under one directory and named
/// `task-<taskId>__<instanceId>` so that concurrent handlers of the same
/// task never share a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLogPaths {
    /// Worker trace log.
    pub trace: PathBuf,
    /// Captured job stdout.
    pub stdout: PathBuf,
    /// Captured job stderr.
    pub stderr: PathBuf,
    /// Network monitor output.
    pub netmon: PathBuf,
}

impl TaskLogPaths {
    pub fn new(log_dir: &Path, task: &TaskId, instance: &InstanceId) -> Self {
        let base = format!("task-{}__{}", task.file_stem(), instance);
        Self {
            trace: log_dir.join(format!("{base}.log")),
            stdout: log_dir.join(format!("{base}__stdout.log")),
            stderr: log_dir.join(format!("{base}__stderr.log")),
            netmon: log_dir.join(format!("{base}__netmon.log")),
        }
    }
}

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup; a second call fails.
pub fn init_logging(level: LogLevel, trace_file: Option<&Path>) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directive) if !directive.trim().is_empty() => {
            EnvFilter::try_new(&directive).with_context(|| format!("invalid RUST_LOG '{directive}'"))?
        }
        _ => EnvFilter::new(level.as_str()),
    };

    let file_layer = match trace_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating log dir {:?}", parent))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening trace log {:?}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    // stderr keeps stdout free for anything wrapping the worker.
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}
