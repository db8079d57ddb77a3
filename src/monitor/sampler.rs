// src/monitor/sampler.rs

//! Per-pid periodic samplers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::telemetry::{Pid, ProcessTelemetry, TelemetryError, TelemetryResult};
use crate::metrics::{MetricsSink, emit};
use crate::types::TaskId;

/// What a sampler measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Io,
    Network,
    Usage,
}

impl SampleKind {
    pub const ALL: [SampleKind; 3] = [SampleKind::Io, SampleKind::Network, SampleKind::Usage];

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Io => "io",
            SampleKind::Network => "network",
            SampleKind::Usage => "usage",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a sampler needs, shared by all samplers of one attempt.
#[derive(Debug, Clone)]
pub struct SamplerContext {
    pub task: TaskId,
    pub telemetry: Arc<dyn ProcessTelemetry>,
    pub metrics: Arc<dyn MetricsSink>,
    pub probe_interval: Duration,
}

/// Sample `kind` for `pid` every probe interval until the process is gone.
///
/// Returns `pid` once the process has disappeared. Other telemetry errors are
/// logged and the loop keeps going.
pub async fn sample_loop(ctx: Arc<SamplerContext>, pid: Pid, kind: SampleKind) -> Pid {
    loop {
        match off_runtime(&ctx, pid, move |ctx| sample_once(ctx, pid, kind)).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(task = %ctx.task, pid, kind = %kind, "process gone; sampler stopped");
                return pid;
            }
            Err(e) => {
                warn!(task = %ctx.task, pid, kind = %kind, error = %e, "sampling failed");
            }
        }
        sleep(ctx.probe_interval).await;
    }
}

/// Run a telemetry lookup on the blocking pool.
///
/// Providers read `/proc` synchronously and hold a lock while refreshing,
/// which must not stall the runtime's worker threads.
pub(crate) async fn off_runtime<T, F>(
    ctx: &Arc<SamplerContext>,
    pid: Pid,
    f: F,
) -> TelemetryResult<T>
where
    F: FnOnce(&SamplerContext) -> TelemetryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let ctx = Arc::clone(ctx);
    match tokio::task::spawn_blocking(move || f(&ctx)).await {
        Ok(res) => res,
        Err(e) => Err(TelemetryError::Failed {
            pid,
            reason: format!("telemetry task failed: {e}"),
        }),
    }
}

/// Take one sample and log it.
pub fn sample_once(ctx: &SamplerContext, pid: Pid, kind: SampleKind) -> TelemetryResult<()> {
    match kind {
        SampleKind::Io => {
            let io = ctx.telemetry.io(pid)?;
            info!(
                target: "wfexec::telemetry",
                task = %ctx.task,
                pid,
                kind = "io",
                read_bytes = io.read_bytes,
                written_bytes = io.written_bytes,
                total_read_bytes = io.total_read_bytes,
                total_written_bytes = io.total_written_bytes,
                "process io"
            );
        }
        SampleKind::Network => {
            for dev in ctx.telemetry.network(pid)? {
                info!(
                    target: "wfexec::telemetry",
                    task = %ctx.task,
                    pid,
                    kind = "network",
                    interface = %dev.interface,
                    rx_bytes = dev.rx_bytes,
                    rx_packets = dev.rx_packets,
                    tx_bytes = dev.tx_bytes,
                    tx_packets = dev.tx_packets,
                    "process network device"
                );
            }
        }
        SampleKind::Usage => {
            let usage = ctx.telemetry.usage(pid)?;
            info!(
                target: "wfexec::telemetry",
                task = %ctx.task,
                pid,
                kind = "usage",
                cpu_percent = usage.cpu_percent,
                memory_bytes = usage.memory_bytes,
                virtual_memory_bytes = usage.virtual_memory_bytes,
                elapsed_secs = usage.elapsed.as_secs(),
                "process usage"
            );
            emit(ctx.metrics.as_ref(), &ctx.task, "cpu_percent", f64::from(usage.cpu_percent));
            emit(ctx.metrics.as_ref(), &ctx.task, "memory_bytes", usage.memory_bytes as f64);
        }
    }
    Ok(())
}
