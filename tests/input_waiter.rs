mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{TestResult, init_tracing};
use tokio::time::{Instant, sleep};
use wfexec::errors::WorkerError;
use wfexec::fs::mock::MockFileSystem;
use wfexec::watch::{InputWaiter, round_delay};

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

#[test]
fn round_delay_doubles_and_is_capped() {
    assert_eq!(round_delay(0, 16), Duration::from_millis(1001));
    assert_eq!(round_delay(1, 16), Duration::from_millis(1002));
    assert_eq!(round_delay(10, 16), Duration::from_millis(2024));
    assert_eq!(round_delay(16, 16), Duration::from_millis(66_536));
    assert_eq!(round_delay(40, 16), round_delay(16, 16));
}

#[tokio::test(start_paused = true)]
async fn present_files_return_without_waiting() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/a", "a");
    fs.add_file("/in/b", "b");
    let waiter = InputWaiter::new(Arc::new(fs.clone()), 3, 16);

    let started = Instant::now();
    waiter.wait_for_inputs(&paths(&["/in/a", "/in/b"])).await?;

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(fs.stat_count("/in/a"), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ready_files_are_never_checked_again() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/early", "e");
    let waiter = InputWaiter::new(Arc::new(fs.clone()), 10, 16);

    let writer = fs.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(3500)).await;
        writer.add_file("/in/late", "l");
    });

    waiter.wait_for_inputs(&paths(&["/in/early", "/in/late"])).await?;

    assert_eq!(fs.stat_count("/in/early"), 1);
    // Rounds at 0, 1001, 2003, 3007 and 4015 ms.
    assert_eq!(fs.stat_count("/in/late"), 5);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn vanished_ready_file_does_not_matter() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/a", "a");
    let waiter = InputWaiter::new(Arc::new(fs.clone()), 5, 16);

    let writer = fs.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(500)).await;
        writer.remove_file("/in/a");
        sleep(Duration::from_millis(1000)).await;
        writer.add_file("/in/b", "b");
    });

    waiter.wait_for_inputs(&paths(&["/in/a", "/in/b"])).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn missing_files_fail_after_max_retries_plus_one_rounds() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/a", "a");
    let waiter = InputWaiter::new(Arc::new(fs.clone()), 3, 16);

    let err = waiter
        .wait_for_inputs(&paths(&["/in/a", "/in/never", "/in/never"]))
        .await
        .unwrap_err();

    match err {
        WorkerError::InputTimeout { missing, rounds } => {
            assert_eq!(missing, paths(&["/in/never"]));
            assert_eq!(rounds, 4);
        }
        other => panic!("expected InputTimeout, got {other:?}"),
    }
    assert_eq!(fs.stat_count("/in/never"), 4);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn zero_retries_checks_exactly_once() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let waiter = InputWaiter::new(Arc::new(fs.clone()), 0, 16);

    let started = Instant::now();
    let err = waiter.wait_for_inputs(&paths(&["/in/x"])).await.unwrap_err();

    assert!(matches!(err, WorkerError::InputTimeout { rounds: 1, .. }));
    assert_eq!(fs.stat_count("/in/x"), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stat_errors_abort_the_wait() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.break_path("/in/locked");
    let waiter = InputWaiter::new(Arc::new(fs.clone()), 10, 16);

    let err = waiter.wait_for_inputs(&paths(&["/in/locked"])).await.unwrap_err();

    assert!(matches!(err, WorkerError::Other(_)));
    assert_eq!(fs.stat_count("/in/locked"), 1);
    Ok(())
}

#[tokio::test]
async fn empty_input_list_is_ready() -> TestResult {
    let waiter = InputWaiter::new(Arc::new(MockFileSystem::new()), 0, 16);
    waiter.wait_for_inputs(&[]).await?;
    Ok(())
}
