// src/metrics.rs

//! Best-effort metrics sink.
//!
//! Metric delivery never affects a task's outcome: a failing sink is logged
//! and otherwise ignored.

use std::fmt::Debug;

use anyhow::Result;
use tracing::{info, warn};

use crate::types::TaskId;

pub trait MetricsSink: Send + Sync + Debug {
    fn record(&self, task: &TaskId, name: &str, value: f64) -> Result<()>;
}

/// Record a metric, logging (and swallowing) any failure.
pub fn emit(sink: &dyn MetricsSink, task: &TaskId, name: &str, value: f64) {
    if let Err(e) = sink.record(task, name, value) {
        warn!(task = %task, metric = name, error = %e, "failed to record metric");
    }
}

/// Sink that turns metrics into `tracing` events under the
/// `wfexec::metrics` target, for log-based collection.
#[derive(Debug, Clone, Default)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn record(&self, task: &TaskId, name: &str, value: f64) -> Result<()> {
        info!(target: "wfexec::metrics", task = %task, metric = name, value, "metric");
        Ok(())
    }
}
