// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the job described by a
//! task, using `tokio::process::Command`, and turning it into one terminal
//! exit code.
//!
//! - [`backend`] provides the `JobRunner` trait and the `ProcessExecutor`
//!   that the orchestrator uses in production, and which tests can replace
//!   with a fake implementation.
//! - [`task_runner`] runs a single attempt: spawn, output wiring, process
//!   tree monitor, wait.
//! - [`retry`] holds the retry state and backoff computation.
//! - [`output`] opens per-attempt output files and copies streams into them.
//! - [`audit`] logs the declared input/output files after the run.

pub mod audit;
pub mod backend;
pub mod output;
pub mod retry;
pub mod task_runner;

pub use audit::{FileAudit, FileRole, NOT_FOUND_SIZE, audit_files};
pub use backend::{ExecutorOptions, JobOutcome, JobRunner, ProcessExecutor};
pub use retry::{RetryState, backoff_delay};
