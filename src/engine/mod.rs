// src/engine/mod.rs

//! Orchestration engine: one task-handling run from acquisition to
//! completion notification.
//!
//! The sequence itself lives in [`orchestrator`]; the pieces it drives are
//! plain functions and ports from the rest of the crate, so each can be
//! replaced in tests (in-memory store, fake runner, mock filesystem).

use std::path::PathBuf;
use std::time::Duration;

use crate::exec::JobOutcome;
use crate::netmon::NetworkMonitorOptions;
use crate::types::ExitCode;

pub mod orchestrator;

pub use orchestrator::Orchestrator;

/// Options for the orchestration sequence.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Descriptor retrieval timeout; zero waits forever.
    pub retrieve_timeout: Duration,
    /// Whether to wait for declared inputs before the first spawn.
    pub wait_for_inputs: bool,
    /// Input-wait round budget (`maxRetries`).
    pub file_watch_retries: u32,
    /// Cap on the input-wait backoff exponent.
    pub max_backoff_round_exponent: u32,
    /// Base for relative input paths.
    pub input_dir: PathBuf,
    /// Base for relative output paths.
    pub output_dir: PathBuf,
    /// Launch an external network monitor around the job when set.
    pub network_monitor: Option<NetworkMonitorOptions>,
}

/// What a task-handling run ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The task was already in its workflow's completion set; nothing ran.
    AlreadyCompleted,
    /// The job ran to a terminal state and the completion was notified.
    Finished(JobOutcome),
}

impl RunOutcome {
    /// Exit code surfaced to whatever invoked the worker.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunOutcome::AlreadyCompleted => 0,
            RunOutcome::Finished(outcome) => outcome.exit_code,
        }
    }
}
