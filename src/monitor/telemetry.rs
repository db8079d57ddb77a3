// src/monitor/telemetry.rs

//! Process telemetry port.

use std::fmt::Debug;
use std::time::Duration;

use thiserror::Error;

pub type Pid = u32;

/// Telemetry failures.
///
/// `NotFound` is the expected end of a process's life and is handled
/// silently by the samplers; anything else is logged and sampling continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("process {0} not found")]
    NotFound(Pid),

    #[error("telemetry for process {pid} failed: {reason}")]
    Failed { pid: Pid, reason: String },
}

impl TelemetryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TelemetryError::NotFound(_))
    }
}

pub type TelemetryResult<T> = std::result::Result<T, TelemetryError>;

/// Disk IO counters of one process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub written_bytes: u64,
    pub total_read_bytes: u64,
    pub total_written_bytes: u64,
}

/// Counters of one network device as seen from a process's namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetDevCounters {
    pub interface: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
}

/// CPU, memory and elapsed time of one process.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usage {
    pub cpu_percent: f32,
    pub memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub elapsed: Duration,
}

/// Source of per-process telemetry.
///
/// Every lookup distinguishes "pid does not exist" from other failures.
pub trait ProcessTelemetry: Send + Sync + Debug {
    /// All transitive children of `root`, excluding `root` itself.
    fn descendants(&self, root: Pid) -> TelemetryResult<Vec<Pid>>;

    fn command_line(&self, pid: Pid) -> TelemetryResult<Vec<String>>;

    fn io(&self, pid: Pid) -> TelemetryResult<IoCounters>;

    fn network(&self, pid: Pid) -> TelemetryResult<Vec<NetDevCounters>>;

    fn usage(&self, pid: Pid) -> TelemetryResult<Usage>;
}
