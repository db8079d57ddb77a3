// src/engine/orchestrator.rs

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::errors::Result;
use crate::exec::{JobRunner, audit_files};
use crate::fs::FileSystem;
use crate::guard;
use crate::job::{JobDescriptor, retrieve};
use crate::netmon::NetworkMonitor;
use crate::notify::CompletionNotifier;
use crate::store::TaskStore;
use crate::types::TaskId;
use crate::watch::InputWaiter;

use super::{OrchestratorOptions, RunOutcome};

/// Sequences one task-handling run.
///
/// Order of operations:
/// 1. bump the acquisition counter (a failure here only warns);
/// 2. stop early if the task is already completed;
/// 3. retrieve the job descriptor;
/// 4. optionally wait for the declared inputs;
/// 5. optionally start the network monitor;
/// 6. run the job to a terminal exit code;
/// 7. notify completion;
/// 8. log the input/output audit;
/// 9. stop the network monitor;
/// 10. return the exit code.
///
/// Errors from steps 2, 3, 4, 6 and 7 abort the run.
pub struct Orchestrator<R: JobRunner> {
    store: Arc<dyn TaskStore>,
    notifier: Arc<dyn CompletionNotifier>,
    runner: R,
    fs: Arc<dyn FileSystem>,
    options: OrchestratorOptions,
}

impl<R: JobRunner> std::fmt::Debug for Orchestrator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: JobRunner> Orchestrator<R> {
    pub fn new(
        store: Arc<dyn TaskStore>,
        notifier: Arc<dyn CompletionNotifier>,
        runner: R,
        fs: Arc<dyn FileSystem>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            store,
            notifier,
            runner,
            fs,
            options,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn handle(&self, task: &TaskId) -> Result<RunOutcome> {
        info!(task = %task, "handling task");

        if let Err(e) = guard::acquire(self.store.as_ref(), task).await {
            warn!(task = %task, error = %e, "could not record acquisition");
        }

        if guard::has_completed(self.store.as_ref(), task).await? {
            return Ok(RunOutcome::AlreadyCompleted);
        }

        let job = retrieve(self.store.as_ref(), task, self.options.retrieve_timeout).await?;

        if self.options.wait_for_inputs && !job.inputs.is_empty() {
            let waiter = InputWaiter::new(
                Arc::clone(&self.fs),
                self.options.file_watch_retries,
                self.options.max_backoff_round_exponent,
            );
            waiter.wait_for_inputs(&self.input_paths(&job)).await?;
        }

        let netmon = self
            .options
            .network_monitor
            .as_ref()
            .and_then(NetworkMonitor::start);

        let outcome = match self.runner.run(task, &job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(task = %task, error = %e, "job execution aborted");
                stop_netmon(netmon).await;
                return Err(e);
            }
        };

        if let Err(e) = self.notifier.notify_completion(task, outcome.exit_code).await {
            error!(task = %task, exit_code = outcome.exit_code, error = %e, "completion notification failed");
            stop_netmon(netmon).await;
            return Err(e);
        }

        audit_files(
            self.fs.as_ref(),
            task,
            &job,
            &self.options.input_dir,
            &self.options.output_dir,
        );

        stop_netmon(netmon).await;

        info!(
            task = %task,
            exit_code = outcome.exit_code,
            attempts = outcome.attempts,
            "task handled"
        );
        Ok(RunOutcome::Finished(outcome))
    }

    fn input_paths(&self, job: &JobDescriptor) -> Vec<PathBuf> {
        job.input_paths()
            .map(|p| self.options.input_dir.join(p))
            .collect()
    }
}

async fn stop_netmon(netmon: Option<NetworkMonitor>) {
    if let Some(monitor) = netmon {
        monitor.stop().await;
    }
}
