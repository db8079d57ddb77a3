mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::{Harness, TestResult, enqueue_job, init_tracing, mark_completed, task, with_timeout};
use wfexec::engine::{Orchestrator, RunOutcome};
use wfexec::errors::WorkerError;
use wfexec::fs::mock::MockFileSystem;
use wfexec::store::keys;
use wfexec_test_utils::builders::{JobDescriptorBuilder, OrchestratorOptionsBuilder};
use wfexec_test_utils::fakes::{FailingTaskStore, FakeJobRunner, RecordingNotifier};

fn options() -> wfexec::engine::OrchestratorOptions {
    OrchestratorOptionsBuilder::new(Path::new("/data")).build()
}

#[tokio::test]
async fn completed_task_is_not_run_again() -> TestResult {
    init_tracing();
    let h = Harness::new(FakeJobRunner::exiting_with(&[0]), options());
    let t = task("task:wf1:3");
    mark_completed(&h.store, &t).await;
    enqueue_job(&h.store, &t, &JobDescriptorBuilder::new("echo").json()).await;

    let outcome = with_timeout(h.orchestrator.handle(&t)).await?;

    assert_eq!(outcome, RunOutcome::AlreadyCompleted);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(h.runs(), 0);
    assert!(h.notifier.notifications().is_empty());
    assert_eq!(h.store.counter(&keys::acquisitions(&t)), 1);
    assert_eq!(
        h.store.members(&keys::completed_tasks(t.workflow())),
        vec!["task:wf1:3".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn every_delivery_increments_the_acquisition_counter() -> TestResult {
    init_tracing();
    let h = Harness::new(FakeJobRunner::exiting_with(&[0]), options());
    let t = task("task:wf1:0");
    enqueue_job(&h.store, &t, &JobDescriptorBuilder::new("echo").json()).await;

    h.orchestrator.handle(&t).await?;
    // Second delivery of the same task: the marker makes it a no-op.
    mark_completed(&h.store, &t).await;
    h.orchestrator.handle(&t).await?;

    assert_eq!(h.store.counter(&keys::acquisitions(&t)), 2);
    assert_eq!(h.runs(), 1);
    Ok(())
}

#[tokio::test]
async fn successful_job_is_run_once_and_notified_once() -> TestResult {
    init_tracing();
    let h = Harness::new(FakeJobRunner::exiting_with(&[0]), options());
    let t = task("task:wf1:1");
    let job = JobDescriptorBuilder::new("mProject").args(&["-X", "in.fits", "out.fits"]);
    enqueue_job(&h.store, &t, &job.json()).await;

    let outcome = with_timeout(h.orchestrator.handle(&t)).await?;

    assert_eq!(outcome.exit_code(), 0);
    let runs = h.orchestrator.runner().runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].0, "task:wf1:1");
    assert_eq!(runs[0].1.args, vec!["-X", "in.fits", "out.fits"]);
    assert_eq!(h.notifier.notifications(), vec![("task:wf1:1".to_string(), 0)]);

    // The descriptor is still there for a potential re-delivery.
    assert_eq!(h.store.queue(&keys::job_message(&t)).len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_job_reports_its_exit_code() -> TestResult {
    init_tracing();
    let h = Harness::new(FakeJobRunner::exiting_with(&[3]), options());
    let t = task("task:wf2:9");
    enqueue_job(&h.store, &t, &JobDescriptorBuilder::new("false").json()).await;

    let outcome = h.orchestrator.handle(&t).await?;

    assert_eq!(outcome.exit_code(), 3);
    assert_eq!(h.notifier.notifications(), vec![("task:wf2:9".to_string(), 3)]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn missing_message_times_out() -> TestResult {
    init_tracing();
    let opts = OrchestratorOptionsBuilder::new(Path::new("/data"))
        .retrieve_timeout(Duration::from_secs(2))
        .build();
    let h = Harness::new(FakeJobRunner::exiting_with(&[0]), opts);
    let t = task("task:wf1:5");

    let err = h.orchestrator.handle(&t).await.unwrap_err();

    assert!(matches!(err, WorkerError::NoMessage { .. }));
    assert_eq!(h.runs(), 0);
    assert!(h.notifier.notifications().is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_descriptor_is_fatal() -> TestResult {
    init_tracing();
    let h = Harness::new(FakeJobRunner::exiting_with(&[0]), options());
    let t = task("task:wf1:6");
    enqueue_job(&h.store, &t, r#"{"args": ["x"]}"#).await;

    let err = h.orchestrator.handle(&t).await.unwrap_err();

    assert!(matches!(err, WorkerError::InvalidDescriptor(_)));
    assert_eq!(h.runs(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn input_timeout_aborts_before_spawn() -> TestResult {
    init_tracing();
    let opts = OrchestratorOptionsBuilder::new(Path::new("/data"))
        .wait_for_inputs(2)
        .build();
    let h = Harness::new(FakeJobRunner::exiting_with(&[0]), opts);
    h.fs.add_file("/data/a.fits", "a");
    let t = task("task:wf1:7");
    let job = JobDescriptorBuilder::new("mAdd").input("a.fits").input("b.fits");
    enqueue_job(&h.store, &t, &job.json()).await;

    let err = h.orchestrator.handle(&t).await.unwrap_err();

    match err {
        WorkerError::InputTimeout { missing, rounds } => {
            assert_eq!(missing, vec![Path::new("/data/b.fits").to_path_buf()]);
            assert_eq!(rounds, 3);
        }
        other => panic!("expected InputTimeout, got {other:?}"),
    }
    assert_eq!(h.runs(), 0);
    assert!(h.notifier.notifications().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn job_runs_once_inputs_appear() -> TestResult {
    init_tracing();
    let opts = OrchestratorOptionsBuilder::new(Path::new("/data"))
        .wait_for_inputs(5)
        .build();
    let h = Harness::new(FakeJobRunner::exiting_with(&[0]), opts);
    let t = task("task:wf1:8");
    let job = JobDescriptorBuilder::new("mAdd").input("late.fits");
    enqueue_job(&h.store, &t, &job.json()).await;

    let fs = h.fs.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        fs.add_file("/data/late.fits", "late");
    });

    let outcome = h.orchestrator.handle(&t).await?;

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(h.runs(), 1);
    Ok(())
}

#[tokio::test]
async fn notification_failure_is_fatal() -> TestResult {
    init_tracing();
    let h = Harness::with_notifier(
        FakeJobRunner::exiting_with(&[0]),
        RecordingNotifier::failing(),
        options(),
    );
    let t = task("task:wf1:2");
    enqueue_job(&h.store, &t, &JobDescriptorBuilder::new("echo").json()).await;

    let err = h.orchestrator.handle(&t).await.unwrap_err();

    assert!(matches!(err, WorkerError::Notify(_)));
    assert_eq!(h.runs(), 1);
    // Attempted exactly once, no local retry.
    assert_eq!(h.notifier.notifications().len(), 1);
    Ok(())
}

#[tokio::test]
async fn runner_error_skips_notification() -> TestResult {
    init_tracing();
    let h = Harness::new(FakeJobRunner::failing(), options());
    let t = task("task:wf1:4");
    enqueue_job(&h.store, &t, &JobDescriptorBuilder::new("echo").json()).await;

    assert!(h.orchestrator.handle(&t).await.is_err());
    assert!(h.notifier.notifications().is_empty());
    Ok(())
}

#[tokio::test]
async fn unreachable_store_is_fatal() -> TestResult {
    init_tracing();
    let runner = FakeJobRunner::exiting_with(&[0]);
    let notifier = RecordingNotifier::new();
    let orchestrator = Orchestrator::new(
        Arc::new(FailingTaskStore),
        Arc::new(notifier.clone()),
        runner,
        Arc::new(MockFileSystem::new()),
        options(),
    );

    let err = orchestrator.handle(&task("task:wf1:0")).await.unwrap_err();

    assert!(matches!(err, WorkerError::Store(_)));
    assert_eq!(orchestrator.runner().run_count(), 0);
    assert!(notifier.notifications().is_empty());
    Ok(())
}
