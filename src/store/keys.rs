// src/store/keys.rs

//! Key naming in the task store.

use crate::types::{TaskId, WorkflowId};

/// Counter incremented every time some worker starts handling the task.
pub fn acquisitions(task: &TaskId) -> String {
    format!("{task}_acquisitions")
}

/// Queue holding the task's job descriptor.
pub fn job_message(task: &TaskId) -> String {
    format!("{task}_msg")
}

/// Queue the completion message is pushed onto.
pub fn job_result(task: &TaskId) -> String {
    format!("{task}_msg_res")
}

/// Set of tasks of `workflow` that reached a notified terminal state.
pub fn completed_tasks(workflow: &WorkflowId) -> String {
    format!("wf:{workflow}:completedTasks")
}
