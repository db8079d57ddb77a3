// src/guard.rs

//! Acquisition and idempotency checks.
//!
//! Delivery of task ids is at-least-once, so the same task may reach more
//! than one worker, or reach a worker again after it already finished. The
//! acquisition counter only makes duplicates visible in the logs; the
//! completion marker is what actually prevents re-execution.

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::store::{TaskStore, keys};
use crate::types::TaskId;

/// Record that this worker started handling `task`; returns the number of
/// handling attempts so far, across all workers.
///
/// A count above one is logged as a duplicate delivery. Nothing else is done
/// about it.
pub async fn acquire(store: &dyn TaskStore, task: &TaskId) -> Result<i64> {
    let count = store.incr(&keys::acquisitions(task)).await?;

    if count > 1 {
        warn!(
            task = %task,
            acquisitions = count,
            "task acquired more than once (duplicate delivery)"
        );
    } else {
        debug!(task = %task, "task acquired");
    }

    Ok(count)
}

/// Whether `task` already reached a notified terminal state.
pub async fn has_completed(store: &dyn TaskStore, task: &TaskId) -> Result<bool> {
    let completed = store
        .sismember(&keys::completed_tasks(task.workflow()), task.as_str())
        .await?;

    if completed {
        info!(task = %task, "task already completed; skipping");
    }

    Ok(completed)
}
