pub mod builders;
pub mod fakes;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use wfexec::store::{InMemoryTaskStore, TaskStore, keys};
use wfexec::types::TaskId;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Parse a task id literal.
pub fn task(id: &str) -> TaskId {
    id.parse().expect("valid task id in test")
}

/// Put a job message where the worker will look for it.
pub async fn enqueue_job(store: &InMemoryTaskStore, task: &TaskId, payload: &str) {
    store
        .push(&keys::job_message(task), payload)
        .await
        .expect("in-memory push cannot fail");
}

/// Mark `task` as completed in its workflow's marker set.
pub async fn mark_completed(store: &InMemoryTaskStore, task: &TaskId) {
    store
        .sadd(&keys::completed_tasks(task.workflow()), task.as_str())
        .await
        .expect("in-memory sadd cannot fail");
}
