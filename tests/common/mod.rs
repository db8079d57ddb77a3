#![allow(dead_code)]

use std::sync::Arc;

use wfexec::engine::{Orchestrator, OrchestratorOptions};
use wfexec::fs::mock::MockFileSystem;
use wfexec::store::{InMemoryTaskStore, TaskStore};
use wfexec_test_utils::fakes::{FakeJobRunner, RecordingNotifier};

pub use wfexec_test_utils::{enqueue_job, init_tracing, mark_completed, task, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Everything an orchestrator test wants to inspect afterwards.
pub struct Harness {
    pub store: InMemoryTaskStore,
    pub notifier: RecordingNotifier,
    pub fs: MockFileSystem,
    pub orchestrator: Orchestrator<FakeJobRunner>,
}

impl Harness {
    pub fn new(runner: FakeJobRunner, options: OrchestratorOptions) -> Self {
        Self::with_notifier(runner, RecordingNotifier::new(), options)
    }

    pub fn with_notifier(
        runner: FakeJobRunner,
        notifier: RecordingNotifier,
        options: OrchestratorOptions,
    ) -> Self {
        let store = InMemoryTaskStore::new();
        let fs = MockFileSystem::new();
        let shared_store: Arc<dyn TaskStore> = Arc::new(store.clone());
        let orchestrator = Orchestrator::new(
            shared_store,
            Arc::new(notifier.clone()),
            runner,
            Arc::new(fs.clone()),
            options,
        );
        Self {
            store,
            notifier,
            fs,
            orchestrator,
        }
    }

    pub fn runs(&self) -> usize {
        self.orchestrator.runner().run_count()
    }
}
