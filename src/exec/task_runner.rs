// src/exec/task_runner.rs

//! A single attempt of a job process.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{Result, WorkerError};
use crate::exec::output::{SinkSpec, open_sinks, tee};
use crate::job::JobDescriptor;
use crate::metrics::MetricsSink;
use crate::monitor::{MonitorOptions, ProcessTelemetry, ProcessTreeMonitor};
use crate::types::{ExitCode, TaskId};

/// How long output copying may lag behind process exit. A descendant that
/// keeps the pipe open longer is cut off.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Everything needed to run one attempt.
#[derive(Debug)]
pub struct Attempt<'a> {
    pub task: &'a TaskId,
    pub job: &'a JobDescriptor,
    pub number: u32,
    pub work_dir: &'a Path,
    pub stdout: Vec<SinkSpec>,
    pub stderr: Vec<SinkSpec>,
}

/// Resource monitoring wired into every attempt.
#[derive(Debug, Clone)]
pub struct MonitorWiring {
    pub telemetry: Arc<dyn ProcessTelemetry>,
    pub metrics: Arc<dyn MetricsSink>,
    pub options: MonitorOptions,
}

/// Spawn the job process, copy its output, monitor its process tree and
/// wait for it to exit.
///
/// Returns the exit code (`-1` when the process was killed by a signal).
/// [`WorkerError::Output`] and [`WorkerError::Spawn`] mean the process never
/// started.
pub async fn run_attempt(attempt: &Attempt<'_>, monitoring: &MonitorWiring) -> Result<ExitCode> {
    let job = attempt.job;
    info!(
        task = %attempt.task,
        attempt = attempt.number,
        job = %job.name,
        executable = %job.executable,
        args = ?job.args,
        "starting job process"
    );

    let stdout_sinks = open_sinks(&attempt.stdout).await?;
    let stderr_sinks = open_sinks(&attempt.stderr).await?;

    let mut cmd = Command::new(&job.executable);
    cmd.args(&job.args)
        .current_dir(attempt.work_dir)
        .env("WFEXEC_TASK_ID", attempt.task.as_str())
        .env("WFEXEC_WORKFLOW_ID", attempt.task.workflow().as_str())
        .env("WFEXEC_ATTEMPT", attempt.number.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| WorkerError::Spawn {
        executable: job.executable.clone(),
        source,
    })?;

    let monitor = child.id().map(|pid| {
        debug!(task = %attempt.task, pid, "job process started");
        ProcessTreeMonitor::spawn(
            pid,
            attempt.task.clone(),
            Arc::clone(&monitoring.telemetry),
            Arc::clone(&monitoring.metrics),
            monitoring.options,
        )
    });

    let copies: Vec<JoinHandle<()>> = [
        child
            .stdout
            .take()
            .map(|out| tokio::spawn(tee(out, stdout_sinks, "stdout"))),
        child
            .stderr
            .take()
            .map(|err| tokio::spawn(tee(err, stderr_sinks, "stderr"))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for job process of task '{}'", attempt.task))?;

    if let Some(monitor) = monitor {
        monitor.stop();
    }

    for mut copy in copies {
        match timeout(OUTPUT_DRAIN_GRACE, &mut copy).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(task = %attempt.task, error = %e, "output copy task failed"),
            Err(_) => {
                warn!(
                    task = %attempt.task,
                    "job output still open after process exit; detaching"
                );
                copy.abort();
            }
        }
    }

    let code = status.code().unwrap_or(-1);
    info!(
        task = %attempt.task,
        attempt = attempt.number,
        exit_code = code,
        success = status.success(),
        "job process exited"
    );

    Ok(code)
}
