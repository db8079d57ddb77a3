// src/notify.rs

//! Completion notification towards the control plane.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::errors::{Result, WorkerError};
use crate::store::{TaskStore, keys};
use crate::types::{ExitCode, InstanceId, TaskId};

#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    /// Report the terminal exit code of `task`.
    ///
    /// Called at most once per task-handling run. An error is fatal for the
    /// run; implementations do not retry on their own.
    async fn notify_completion(&self, task: &TaskId, exit_code: ExitCode) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    task_id: &'a str,
    code: ExitCode,
    instance: &'a str,
}

/// Notifier that reports through the task store: the completion message is
/// pushed onto the task's result queue and the task is added to its
/// workflow's completion marker set.
#[derive(Clone)]
pub struct StoreCompletionNotifier {
    store: Arc<dyn TaskStore>,
    instance: InstanceId,
}

impl std::fmt::Debug for StoreCompletionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCompletionNotifier")
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl StoreCompletionNotifier {
    pub fn new(store: Arc<dyn TaskStore>, instance: InstanceId) -> Self {
        Self { store, instance }
    }
}

#[async_trait]
impl CompletionNotifier for StoreCompletionNotifier {
    async fn notify_completion(&self, task: &TaskId, exit_code: ExitCode) -> Result<()> {
        let message = serde_json::to_string(&CompletionMessage {
            kind: "completion",
            task_id: task.as_str(),
            code: exit_code,
            instance: self.instance.as_str(),
        })
        .map_err(|e| WorkerError::Notify(e.to_string()))?;

        self.store
            .push(&keys::job_result(task), &message)
            .await
            .map_err(|e| WorkerError::Notify(e.to_string()))?;
        self.store
            .sadd(&keys::completed_tasks(task.workflow()), task.as_str())
            .await
            .map_err(|e| WorkerError::Notify(e.to_string()))?;

        info!(task = %task, exit_code, "completion notified");
        Ok(())
    }
}
