// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod guard;
pub mod job;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod netmon;
pub mod notify;
pub mod store;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::WorkerConfig;
use crate::engine::{Orchestrator, RunOutcome};
use crate::errors::Result;
use crate::exec::ProcessExecutor;
use crate::fs::RealFileSystem;
use crate::logging::TaskLogPaths;
use crate::metrics::{MetricsSink, TracingMetricsSink};
use crate::monitor::{ProcessTelemetry, SysinfoTelemetry};
use crate::notify::StoreCompletionNotifier;
use crate::store::{RedisTaskStore, TaskStore};
use crate::types::TaskId;

/// High-level entry point used by `main.rs`.
///
/// Wires the production pieces together:
/// - Redis task store (acquisition, descriptor, completion)
/// - sysinfo-backed process telemetry and tracing metrics
/// - process executor with retries
/// - the orchestration sequence for one task
pub async fn run(cfg: WorkerConfig, task: TaskId) -> Result<RunOutcome> {
    let paths = TaskLogPaths::new(&cfg.log_dir, &task, &cfg.worker_id);

    info!(
        worker = %cfg.worker_id,
        task = %task,
        pid = std::process::id(),
        work_dir = ?cfg.work_dir,
        "worker started"
    );
    debug!(config = ?cfg, "effective configuration");

    let store: Arc<dyn TaskStore> = Arc::new(RedisTaskStore::connect(&cfg.task_store_url).await?);
    let notifier = Arc::new(StoreCompletionNotifier::new(
        Arc::clone(&store),
        cfg.worker_id.clone(),
    ));

    let telemetry: Arc<dyn ProcessTelemetry> = Arc::new(SysinfoTelemetry::new());
    let metrics: Arc<dyn MetricsSink> = Arc::new(TracingMetricsSink);
    let executor = ProcessExecutor::new(cfg.executor_options(&paths), telemetry, metrics);

    let orchestrator = Orchestrator::new(
        store,
        notifier,
        executor,
        Arc::new(RealFileSystem),
        cfg.orchestrator_options(&paths),
    );

    orchestrator.handle(&task).await
}

/// Map a job exit code onto a process exit status.
///
/// Codes outside `0..=255` cannot be passed through; negative codes (no
/// exit code at all) become `1`.
pub fn exit_status(code: types::ExitCode) -> i32 {
    if code < 0 { 1 } else { code.min(255) }
}

#[cfg(test)]
mod tests {
    use super::exit_status;

    #[test]
    fn exit_status_is_clamped() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(3), 3);
        assert_eq!(exit_status(300), 255);
        assert_eq!(exit_status(-1), 1);
    }
}
