mod common;

use std::time::Duration;

use common::{TestResult, enqueue_job, init_tracing, mark_completed, task, with_timeout};
use serde_json::Value;
use wfexec::errors::WorkerError;
use wfexec::guard;
use wfexec::job::retrieve;
use wfexec::notify::{CompletionNotifier, StoreCompletionNotifier};
use wfexec::store::{InMemoryTaskStore, TaskStore, keys};
use wfexec::types::InstanceId;
use wfexec_test_utils::builders::JobDescriptorBuilder;

#[test]
fn key_names() {
    let t = task("task:wf:1:12");
    assert_eq!(keys::acquisitions(&t), "task:wf:1:12_acquisitions");
    assert_eq!(keys::job_message(&t), "task:wf:1:12_msg");
    assert_eq!(keys::job_result(&t), "task:wf:1:12_msg_res");
    assert_eq!(keys::completed_tasks(t.workflow()), "wf:wf:1:completedTasks");
}

#[tokio::test]
async fn pop_requeue_leaves_the_message_in_place() -> TestResult {
    let store = InMemoryTaskStore::new();
    store.push("q", "only").await?;

    let first = store.pop_requeue("q", Duration::from_secs(1)).await?;
    let second = store.pop_requeue("q", Duration::from_secs(1)).await?;

    assert_eq!(first.as_deref(), Some("only"));
    assert_eq!(second.as_deref(), Some("only"));
    assert_eq!(store.queue("q"), vec!["only".to_string()]);
    Ok(())
}

#[tokio::test]
async fn pop_requeue_rotates_oldest_first() -> TestResult {
    let store = InMemoryTaskStore::new();
    store.push("q", "a").await?;
    store.push("q", "b").await?;

    let got = store.pop_requeue("q", Duration::from_secs(1)).await?;

    assert_eq!(got.as_deref(), Some("a"));
    assert_eq!(store.queue("q"), vec!["a".to_string(), "b".to_string()]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn pop_requeue_times_out_on_empty_queue() -> TestResult {
    let store = InMemoryTaskStore::new();
    let got = store.pop_requeue("q", Duration::from_secs(3)).await?;
    assert_eq!(got, None);
    Ok(())
}

#[tokio::test]
async fn pop_requeue_wakes_up_on_push() -> TestResult {
    let store = InMemoryTaskStore::new();
    let producer = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        producer.push("q", "late").await.unwrap();
    });

    // Zero timeout blocks until something arrives.
    let got = with_timeout(store.pop_requeue("q", Duration::ZERO)).await?;
    assert_eq!(got.as_deref(), Some("late"));
    Ok(())
}

#[tokio::test]
async fn acquire_counts_every_delivery() -> TestResult {
    init_tracing();
    let store = InMemoryTaskStore::new();
    let t = task("task:wf:0");

    assert_eq!(guard::acquire(&store, &t).await?, 1);
    assert_eq!(guard::acquire(&store, &t).await?, 2);
    assert_eq!(store.counter(&keys::acquisitions(&t)), 2);
    Ok(())
}

#[tokio::test]
async fn completion_marker_is_per_workflow() -> TestResult {
    let store = InMemoryTaskStore::new();
    let done = task("task:wf1:0");
    mark_completed(&store, &done).await;

    assert!(guard::has_completed(&store, &done).await?);
    assert!(!guard::has_completed(&store, &task("task:wf2:0")).await?);
    assert!(!guard::has_completed(&store, &task("task:wf1:1")).await?);
    Ok(())
}

#[tokio::test]
async fn retrieve_parses_and_keeps_the_descriptor() -> TestResult {
    init_tracing();
    let store = InMemoryTaskStore::new();
    let t = task("task:wf:3");
    let job = JobDescriptorBuilder::new("mAdd")
        .name("add")
        .args(&["-p", "."])
        .input("a.fits")
        .output("out.fits");
    enqueue_job(&store, &t, &job.json()).await;

    let first = retrieve(&store, &t, Duration::from_secs(1)).await?;
    let again = retrieve(&store, &t, Duration::from_secs(1)).await?;

    assert_eq!(first, again);
    assert_eq!(first.name, "add");
    assert_eq!(first.executable, "mAdd");
    assert_eq!(first.args, vec!["-p", "."]);
    assert_eq!(first.inputs.len(), 1);
    assert_eq!(first.outputs.len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retrieve_without_message_is_no_message() -> TestResult {
    let store = InMemoryTaskStore::new();
    let err = retrieve(&store, &task("task:wf:4"), Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::NoMessage { .. }));
    Ok(())
}

#[tokio::test]
async fn notifier_pushes_result_and_marks_completion() -> TestResult {
    init_tracing();
    let store = InMemoryTaskStore::new();
    let notifier = StoreCompletionNotifier::new(
        std::sync::Arc::new(store.clone()),
        InstanceId::new("worker-1"),
    );
    let t = task("task:wf9:2");

    notifier.notify_completion(&t, 5).await?;

    let results = store.queue(&keys::job_result(&t));
    assert_eq!(results.len(), 1);
    let msg: Value = serde_json::from_str(&results[0])?;
    assert_eq!(msg["type"], "completion");
    assert_eq!(msg["taskId"], "task:wf9:2");
    assert_eq!(msg["code"], 5);
    assert_eq!(msg["instance"], "worker-1");

    assert!(guard::has_completed(&store, &t).await?);
    Ok(())
}

#[tokio::test]
async fn srem_removes_members() -> TestResult {
    let store = InMemoryTaskStore::new();
    assert!(store.sadd("s", "x").await?);
    assert!(!store.sadd("s", "x").await?);
    assert!(store.srem("s", "x").await?);
    assert!(!store.sismember("s", "x").await?);
    Ok(())
}
