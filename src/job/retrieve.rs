// src/job/retrieve.rs

use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{Result, WorkerError};
use crate::job::JobDescriptor;
use crate::store::{TaskStore, keys};
use crate::types::TaskId;

/// Fetch the job descriptor of `task`, waiting up to `timeout`
/// (`Duration::ZERO` waits forever).
///
/// The message is left in the store (see [`TaskStore::pop_requeue`]), so a
/// crash of this worker before completion does not lose the task.
///
/// Errors:
/// - [`WorkerError::Store`] if the store cannot be reached;
/// - [`WorkerError::NoMessage`] if nothing arrived in time;
/// - [`WorkerError::InvalidDescriptor`] if the payload does not validate.
pub async fn retrieve(
    store: &dyn TaskStore,
    task: &TaskId,
    timeout: Duration,
) -> Result<JobDescriptor> {
    let queue = keys::job_message(task);
    debug!(task = %task, queue = %queue, ?timeout, "waiting for job message");

    let payload = store
        .pop_requeue(&queue, timeout)
        .await?
        .ok_or_else(|| WorkerError::NoMessage {
            task: task.to_string(),
            timeout,
        })?;

    let job = JobDescriptor::parse(&payload)?;

    info!(
        task = %task,
        job = %job.name,
        executable = %job.executable,
        args = ?job.args,
        inputs = job.inputs.len(),
        outputs = job.outputs.len(),
        "job message received"
    );

    Ok(job)
}
