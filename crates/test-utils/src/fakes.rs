//! Fakes for the worker's ports: job runner, notifier, metrics, telemetry
//! and a task store that always fails.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use wfexec::errors::{Result, WorkerError};
use wfexec::exec::{JobOutcome, JobRunner};
use wfexec::job::JobDescriptor;
use wfexec::metrics::MetricsSink;
use wfexec::monitor::{
    IoCounters, NetDevCounters, Pid, ProcessTelemetry, TelemetryError, TelemetryResult, Usage,
};
use wfexec::notify::CompletionNotifier;
use wfexec::store::TaskStore;
use wfexec::types::{ExitCode, TaskId};

/// A fake job runner that:
/// - records every job it was asked to run
/// - answers with scripted exit codes (the last one repeats)
/// - or fails outright when built with [`FakeJobRunner::failing`].
#[derive(Clone, Default)]
pub struct FakeJobRunner {
    codes: Arc<Mutex<VecDeque<ExitCode>>>,
    runs: Arc<Mutex<Vec<(String, JobDescriptor)>>>,
    fail: bool,
}

impl FakeJobRunner {
    pub fn exiting_with(codes: &[ExitCode]) -> Self {
        Self {
            codes: Arc::new(Mutex::new(codes.iter().copied().collect())),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn runs(&self) -> Vec<(String, JobDescriptor)> {
        self.runs.lock().unwrap().clone()
    }

    fn next_code(&self) -> ExitCode {
        let mut codes = self.codes.lock().unwrap();
        match codes.len() {
            0 => 0,
            1 => codes[0],
            _ => codes.pop_front().unwrap_or(0),
        }
    }
}

impl JobRunner for FakeJobRunner {
    fn run<'a>(
        &'a self,
        task: &'a TaskId,
        job: &'a JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<JobOutcome>> + Send + 'a>> {
        Box::pin(async move {
            self.runs
                .lock()
                .unwrap()
                .push((task.to_string(), job.clone()));

            if self.fail {
                return Err(WorkerError::Other(anyhow::anyhow!("runner exploded")));
            }
            Ok(JobOutcome {
                exit_code: self.next_code(),
                attempts: 1,
                duration: Duration::from_millis(1),
            })
        })
    }
}

/// Notifier that records every notification, optionally failing them.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, ExitCode)>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> Vec<(String, ExitCode)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionNotifier for RecordingNotifier {
    async fn notify_completion(&self, task: &TaskId, exit_code: ExitCode) -> Result<()> {
        self.sent.lock().unwrap().push((task.to_string(), exit_code));
        if self.fail {
            return Err(WorkerError::Notify("control plane unreachable".to_string()));
        }
        Ok(())
    }
}

/// Metrics sink keeping every recorded value.
#[derive(Debug, Clone, Default)]
pub struct RecordingMetrics {
    values: Arc<Mutex<Vec<(String, f64)>>>,
}

impl RecordingMetrics {
    pub fn values(&self, name: &str) -> Vec<f64> {
        self.values
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, _task: &TaskId, name: &str, value: f64) -> anyhow::Result<()> {
        self.values.lock().unwrap().push((name.to_string(), value));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ProcessTable {
    alive: HashSet<Pid>,
    parents: HashMap<Pid, Pid>,
    cmdlines: HashMap<Pid, Vec<String>>,
    broken_io: HashSet<Pid>,
    calls: HashMap<(Pid, &'static str), usize>,
}

/// Scripted process table.
///
/// Processes are started and ended by the test while the monitor runs;
/// every telemetry call is counted per pid and kind (`"descendants"`,
/// `"command_line"`, `"io"`, `"network"`, `"usage"`).
#[derive(Debug, Clone, Default)]
pub struct FakeTelemetry {
    table: Arc<Mutex<ProcessTable>>,
}

impl FakeTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_process(&self, pid: Pid, parent: Option<Pid>, cmdline: &[&str]) {
        let mut table = self.table.lock().unwrap();
        table.alive.insert(pid);
        if let Some(parent) = parent {
            table.parents.insert(pid, parent);
        }
        table
            .cmdlines
            .insert(pid, cmdline.iter().map(|s| s.to_string()).collect());
    }

    pub fn end_process(&self, pid: Pid) {
        self.table.lock().unwrap().alive.remove(&pid);
    }

    /// Make IO lookups of `pid` fail with a non-NotFound error.
    pub fn break_io(&self, pid: Pid) {
        self.table.lock().unwrap().broken_io.insert(pid);
    }

    pub fn calls(&self, pid: Pid, kind: &str) -> usize {
        let table = self.table.lock().unwrap();
        table
            .calls
            .iter()
            .filter(|((p, k), _)| *p == pid && *k == kind)
            .map(|(_, n)| *n)
            .sum()
    }

    fn lookup<T>(
        &self,
        pid: Pid,
        kind: &'static str,
        f: impl FnOnce(&ProcessTable) -> TelemetryResult<T>,
    ) -> TelemetryResult<T> {
        let mut table = self.table.lock().unwrap();
        *table.calls.entry((pid, kind)).or_default() += 1;
        if !table.alive.contains(&pid) {
            return Err(TelemetryError::NotFound(pid));
        }
        f(&*table)
    }
}

impl ProcessTelemetry for FakeTelemetry {
    fn descendants(&self, root: Pid) -> TelemetryResult<Vec<Pid>> {
        self.lookup(root, "descendants", |table| {
            let mut found = Vec::new();
            let mut frontier = vec![root];
            while let Some(parent) = frontier.pop() {
                let mut children: Vec<Pid> = table
                    .parents
                    .iter()
                    .filter(|(child, p)| **p == parent && table.alive.contains(*child))
                    .map(|(child, _)| *child)
                    .collect();
                children.sort_unstable();
                frontier.extend(children.iter().copied());
                found.extend(children);
            }
            Ok(found)
        })
    }

    fn command_line(&self, pid: Pid) -> TelemetryResult<Vec<String>> {
        self.lookup(pid, "command_line", |table| {
            Ok(table.cmdlines.get(&pid).cloned().unwrap_or_default())
        })
    }

    fn io(&self, pid: Pid) -> TelemetryResult<IoCounters> {
        self.lookup(pid, "io", |table| {
            if table.broken_io.contains(&pid) {
                return Err(TelemetryError::Failed {
                    pid,
                    reason: "permission denied".to_string(),
                });
            }
            Ok(IoCounters {
                read_bytes: 10,
                written_bytes: 20,
                total_read_bytes: 100,
                total_written_bytes: 200,
            })
        })
    }

    fn network(&self, pid: Pid) -> TelemetryResult<Vec<NetDevCounters>> {
        self.lookup(pid, "network", |_| {
            Ok(vec![NetDevCounters {
                interface: "eth0".to_string(),
                rx_bytes: 1,
                rx_packets: 1,
                tx_bytes: 1,
                tx_packets: 1,
            }])
        })
    }

    fn usage(&self, pid: Pid) -> TelemetryResult<Usage> {
        self.lookup(pid, "usage", |_| {
            Ok(Usage {
                cpu_percent: 12.5,
                memory_bytes: 4096,
                virtual_memory_bytes: 8192,
                elapsed: Duration::from_secs(1),
            })
        })
    }
}

/// Task store whose every operation fails.
#[derive(Debug, Clone, Default)]
pub struct FailingTaskStore;

fn unavailable<T>() -> Result<T> {
    Err(WorkerError::Store("connection refused".to_string()))
}

#[async_trait]
impl TaskStore for FailingTaskStore {
    async fn incr(&self, _key: &str) -> Result<i64> {
        unavailable()
    }

    async fn sadd(&self, _set: &str, _member: &str) -> Result<bool> {
        unavailable()
    }

    async fn srem(&self, _set: &str, _member: &str) -> Result<bool> {
        unavailable()
    }

    async fn sismember(&self, _set: &str, _member: &str) -> Result<bool> {
        unavailable()
    }

    async fn push(&self, _queue: &str, _payload: &str) -> Result<()> {
        unavailable()
    }

    async fn pop_requeue(&self, _queue: &str, _timeout: Duration) -> Result<Option<String>> {
        unavailable()
    }
}
