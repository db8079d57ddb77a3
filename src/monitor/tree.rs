// src/monitor/tree.rs

//! Process tree discovery.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::sampler::{SampleKind, SamplerContext, off_runtime, sample_loop};
use super::telemetry::{Pid, ProcessTelemetry, TelemetryError};
use crate::metrics::MetricsSink;
use crate::types::TaskId;

pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    /// How often the tree is searched for new descendants.
    pub discovery_interval: Duration,
    /// How often each per-pid sampler takes a sample.
    pub probe_interval: Duration,
}

impl MonitorOptions {
    pub fn new(probe_interval: Duration) -> Self {
        Self {
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL,
            probe_interval,
        }
    }
}

/// Lifecycle of a tracked pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidState {
    Discovered,
    Sampling,
    Gone,
}

#[derive(Debug)]
struct TrackedPid {
    state: PidState,
    live_samplers: usize,
}

/// The set of pids seen in one job's process tree.
///
/// Pids are only ever added, once each; a pid that is gone stays in the set
/// so that a recycled pid number is not picked up again.
#[derive(Debug, Default)]
pub struct ProcessTree {
    pids: HashMap<Pid, TrackedPid>,
}

impl ProcessTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `pid`. Returns `false` if it was already tracked.
    pub fn track(&mut self, pid: Pid) -> bool {
        if self.pids.contains_key(&pid) {
            return false;
        }
        self.pids.insert(
            pid,
            TrackedPid {
                state: PidState::Discovered,
                live_samplers: 0,
            },
        );
        true
    }

    /// Mark `samplers` samplers as running for `pid`.
    pub fn sampling(&mut self, pid: Pid, samplers: usize) {
        if let Some(entry) = self.pids.get_mut(&pid) {
            entry.state = PidState::Sampling;
            entry.live_samplers += samplers;
        }
    }

    /// One sampler of `pid` finished. Returns the resulting state.
    pub fn sampler_finished(&mut self, pid: Pid) -> Option<PidState> {
        let entry = self.pids.get_mut(&pid)?;
        entry.live_samplers = entry.live_samplers.saturating_sub(1);
        if entry.live_samplers == 0 {
            entry.state = PidState::Gone;
        }
        Some(entry.state)
    }

    pub fn state(&self, pid: Pid) -> Option<PidState> {
        self.pids.get(&pid).map(|e| e.state)
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }
}

/// Resource monitor for one attempt's process tree.
///
/// Runs a discovery loop that finds descendants of the root pid and starts
/// IO, network and usage samplers for each new one. All samplers live in a
/// `JoinSet` owned by the discovery task: dropping or stopping the monitor
/// aborts the discovery loop and with it every sampler.
#[derive(Debug)]
pub struct ProcessTreeMonitor {
    root: Pid,
    handle: JoinHandle<()>,
}

impl ProcessTreeMonitor {
    pub fn spawn(
        root: Pid,
        task: TaskId,
        telemetry: Arc<dyn ProcessTelemetry>,
        metrics: Arc<dyn MetricsSink>,
        options: MonitorOptions,
    ) -> Self {
        let ctx = Arc::new(SamplerContext {
            task,
            telemetry,
            metrics,
            probe_interval: options.probe_interval,
        });
        let handle = tokio::spawn(discovery_loop(root, ctx, options.discovery_interval));
        Self { root, handle }
    }

    pub fn root(&self) -> Pid {
        self.root
    }

    /// True once the root is gone and every sampler has ended on its own.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Tear down discovery and all samplers.
    pub fn stop(self) {
        debug!(root = self.root, "stopping process tree monitor");
    }
}

impl Drop for ProcessTreeMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn discovery_loop(root: Pid, ctx: Arc<SamplerContext>, interval: Duration) {
    let mut tree = ProcessTree::new();
    let mut samplers: JoinSet<Pid> = JoinSet::new();

    tree.track(root);
    start_tracking(&ctx, &mut tree, &mut samplers, root).await;

    loop {
        reap_samplers(&ctx, &mut tree, &mut samplers);

        match off_runtime(&ctx, root, move |ctx| ctx.telemetry.descendants(root)).await {
            Ok(pids) => {
                for pid in pids {
                    if tree.track(pid) {
                        start_tracking(&ctx, &mut tree, &mut samplers, pid).await;
                    }
                }
            }
            Err(TelemetryError::NotFound(_)) => {
                debug!(task = %ctx.task, root, "root process gone; discovery stopped");
                break;
            }
            Err(e) => {
                warn!(task = %ctx.task, root, error = %e, "listing descendants failed");
            }
        }

        sleep(interval).await;
    }

    // Orphaned descendants can outlive the root; let their samplers run out.
    while let Some(res) = samplers.join_next().await {
        if let Ok(pid) = res {
            tree.sampler_finished(pid);
        }
    }
    debug!(task = %ctx.task, root, tracked = tree.len(), "process tree monitor finished");
}

async fn start_tracking(
    ctx: &Arc<SamplerContext>,
    tree: &mut ProcessTree,
    samplers: &mut JoinSet<Pid>,
    pid: Pid,
) {
    match off_runtime(ctx, pid, move |ctx| ctx.telemetry.command_line(pid)).await {
        Ok(cmd) => info!(
            target: "wfexec::telemetry",
            task = %ctx.task,
            pid,
            kind = "command_line",
            command = ?cmd,
            "process discovered"
        ),
        Err(TelemetryError::NotFound(_)) => {
            debug!(task = %ctx.task, pid, "process exited before it could be inspected");
        }
        Err(e) => warn!(task = %ctx.task, pid, error = %e, "reading command line failed"),
    }

    for kind in SampleKind::ALL {
        samplers.spawn(sample_loop(Arc::clone(ctx), pid, kind));
    }
    tree.sampling(pid, SampleKind::ALL.len());
}

fn reap_samplers(ctx: &SamplerContext, tree: &mut ProcessTree, samplers: &mut JoinSet<Pid>) {
    while let Some(res) = samplers.try_join_next() {
        match res {
            Ok(pid) => {
                if tree.sampler_finished(pid) == Some(PidState::Gone) {
                    debug!(task = %ctx.task, pid, "process left the tree");
                }
            }
            Err(e) => warn!(task = %ctx.task, error = %e, "sampler task failed"),
        }
    }
}
