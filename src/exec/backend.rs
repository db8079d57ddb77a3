// src/exec/backend.rs

//! Pluggable job runner abstraction.
//!
//! The orchestrator talks to a `JobRunner` instead of spawning processes
//! itself. Production uses [`ProcessExecutor`]; tests can provide a runner
//! that records what it was asked to run and returns scripted exit codes.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::errors::{Result, WorkerError};
use crate::exec::output::SinkSpec;
use crate::exec::retry::RetryState;
use crate::exec::task_runner::{Attempt, MonitorWiring, run_attempt};
use crate::job::JobDescriptor;
use crate::metrics::{MetricsSink, emit};
use crate::monitor::{MonitorOptions, ProcessTelemetry};
use crate::types::{ExitCode, TaskId};

/// Terminal result of running a job, across all attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub exit_code: ExitCode,
    pub attempts: u32,
    pub duration: Duration,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait abstracting how a job is run to a terminal exit code.
pub trait JobRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        task: &'a TaskId,
        job: &'a JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutcome>> + Send + 'a>>;
}

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Working directory of the job; relative redirect paths resolve here.
    pub work_dir: PathBuf,
    /// The task's stdout capture file.
    pub stdout_log: PathBuf,
    /// The task's stderr capture file.
    pub stderr_log: PathBuf,
    /// Retries after the first attempt.
    pub retries: u32,
    /// Seed of the randomized backoff between attempts.
    pub backoff_seed: Duration,
    pub monitor: MonitorOptions,
}

/// Runs the job as an OS process, retrying failed attempts with backoff.
///
/// State machine per run: spawn, run, exit; exit 0 completes, a non-zero
/// exit either schedules another attempt after a random backoff or, with no
/// retries left, fails with the last exit code. A program that cannot be
/// started, or whose output files cannot be opened, counts as an attempt
/// that exited with `-1`.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    options: ExecutorOptions,
    monitoring: MonitorWiring,
}

impl ProcessExecutor {
    pub fn new(
        options: ExecutorOptions,
        telemetry: Arc<dyn ProcessTelemetry>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let monitoring = MonitorWiring {
            telemetry,
            metrics,
            options: options.monitor,
        };
        Self {
            options,
            monitoring,
        }
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    fn sinks(&self, job: &JobDescriptor, first_attempt: bool) -> (Vec<SinkSpec>, Vec<SinkSpec>) {
        let work_dir = &self.options.work_dir;

        let mut stdout = vec![SinkSpec::capture(&self.options.stdout_log, first_attempt)];
        if let Some(target) = &job.stdout {
            stdout.push(SinkSpec::redirect(target, work_dir, first_attempt));
        }

        let mut stderr = vec![SinkSpec::capture(&self.options.stderr_log, first_attempt)];
        if let Some(target) = &job.stderr {
            stderr.push(SinkSpec::redirect(target, work_dir, first_attempt));
        }

        (stdout, stderr)
    }

    pub async fn execute(&self, task: &TaskId, job: &JobDescriptor) -> Result<JobOutcome> {
        let started = Instant::now();
        let mut state = RetryState::new(self.options.retries, self.options.backoff_seed.as_secs());

        let exit_code = loop {
            let (stdout, stderr) = self.sinks(job, state.is_first_attempt());
            let attempt = Attempt {
                task,
                job,
                number: state.attempt(),
                work_dir: &self.options.work_dir,
                stdout,
                stderr,
            };

            let code = match run_attempt(&attempt, &self.monitoring).await {
                Ok(code) => code,
                Err(WorkerError::Spawn { executable, source }) => {
                    error!(
                        task = %task,
                        attempt = attempt.number,
                        executable = %executable,
                        error = %source,
                        "failed to start job process"
                    );
                    -1
                }
                Err(WorkerError::Output { path, source }) => {
                    error!(
                        task = %task,
                        attempt = attempt.number,
                        path = ?path,
                        error = %source,
                        "failed to open job output"
                    );
                    -1
                }
                Err(e) => return Err(e),
            };

            if code == 0 {
                info!(task = %task, attempts = state.attempt(), "job completed");
                break code;
            }

            let delay = state.on_failure(&mut rand::thread_rng());
            match delay {
                Some(delay) => {
                    warn!(
                        task = %task,
                        exit_code = code,
                        failed_attempt = attempt.number,
                        remaining_retries = state.remaining_retries(),
                        ?delay,
                        "job failed; retrying after backoff"
                    );
                    sleep(delay).await;
                }
                None => {
                    error!(
                        task = %task,
                        exit_code = code,
                        attempts = state.attempt(),
                        "job failed; no retries left"
                    );
                    break code;
                }
            }
        };

        let outcome = JobOutcome {
            exit_code,
            attempts: state.attempt(),
            duration: started.elapsed(),
        };

        let metrics = self.monitoring.metrics.as_ref();
        emit(metrics, task, "attempts", f64::from(outcome.attempts));
        emit(metrics, task, "exit_code", f64::from(outcome.exit_code));
        emit(metrics, task, "job_duration_ms", outcome.duration.as_millis() as f64);

        info!(
            task = %task,
            exit_code = outcome.exit_code,
            attempts = outcome.attempts,
            duration_ms = outcome.duration.as_millis() as u64,
            "job finished"
        );

        Ok(outcome)
    }
}

impl JobRunner for ProcessExecutor {
    fn run<'a>(
        &'a self,
        task: &'a TaskId,
        job: &'a JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutcome>> + Send + 'a>> {
        Box::pin(self.execute(task, job))
    }
}
