// src/monitor/mod.rs

//! Resource monitoring of a job's process tree.
//!
//! - [`telemetry`] is the port: per-pid lookups that tell "pid not found"
//!   apart from other failures.
//! - [`sysinfo_provider`] implements it with `sysinfo` and `/proc`.
//! - [`tree`] discovers descendants of the job process and owns the samplers.
//! - [`sampler`] holds the per-pid, per-kind sampling loops.
//! - [`netdev`] parses `/proc/<pid>/net/dev`.

pub mod netdev;
pub mod sampler;
pub mod sysinfo_provider;
pub mod telemetry;
pub mod tree;

pub use sampler::{SampleKind, SamplerContext};
pub use sysinfo_provider::SysinfoTelemetry;
pub use telemetry::{
    IoCounters, NetDevCounters, Pid, ProcessTelemetry, TelemetryError, TelemetryResult, Usage,
};
pub use tree::{MonitorOptions, PidState, ProcessTree, ProcessTreeMonitor};
