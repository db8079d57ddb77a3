// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::cli::{CliArgs, LogLevel};
use crate::engine::OrchestratorOptions;
use crate::exec::ExecutorOptions;
use crate::logging::TaskLogPaths;
use crate::monitor::MonitorOptions;
use crate::netmon::NetworkMonitorOptions;
use crate::types::InstanceId;

pub const DEFAULT_LOG_SUBDIR: &str = "logs";
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_NUMBER_OF_RETRIES: u32 = 1;
pub const DEFAULT_BACKOFF_SEED_SECS: u64 = 10;
pub const DEFAULT_FILE_WATCH_NUM_RETRIES: u32 = 10;
pub const DEFAULT_TASK_STORE_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_MAX_BACKOFF_ROUND_EXPONENT: u32 = 16;

/// Worker settings as read from a TOML file or collected from CLI/env.
///
/// Every key is optional; missing keys fall back to the built-in defaults
/// during validation.
///
/// ```toml
/// work_dir = "/data/wf1"
/// probe_interval = 500
/// number_of_retries = 3
/// wait_for_input_files = true
/// task_store_url = "redis://queue:6379"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawWorkerConfig {
    pub work_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    /// Milliseconds.
    pub probe_interval: Option<u64>,
    pub number_of_retries: Option<u32>,
    /// Seconds.
    pub backoff_seed: Option<u64>,
    pub wait_for_input_files: Option<bool>,
    pub file_watch_num_retries: Option<u32>,
    pub enable_network_monitor: Option<bool>,
    /// Parsed during validation so that a bad value is a config error.
    pub log_level: Option<String>,
    pub task_store_url: Option<String>,
    pub worker_id: Option<String>,
    /// Seconds; 0 waits forever.
    pub retrieve_timeout: Option<u64>,
    pub max_backoff_round_exponent: Option<u32>,
}

impl RawWorkerConfig {
    /// Layer `upper` on top of `self`: keys set in `upper` win.
    pub fn overlay(self, upper: RawWorkerConfig) -> RawWorkerConfig {
        RawWorkerConfig {
            work_dir: upper.work_dir.or(self.work_dir),
            log_dir: upper.log_dir.or(self.log_dir),
            input_dir: upper.input_dir.or(self.input_dir),
            output_dir: upper.output_dir.or(self.output_dir),
            probe_interval: upper.probe_interval.or(self.probe_interval),
            number_of_retries: upper.number_of_retries.or(self.number_of_retries),
            backoff_seed: upper.backoff_seed.or(self.backoff_seed),
            wait_for_input_files: upper.wait_for_input_files.or(self.wait_for_input_files),
            file_watch_num_retries: upper.file_watch_num_retries.or(self.file_watch_num_retries),
            enable_network_monitor: upper
                .enable_network_monitor
                .or(self.enable_network_monitor),
            log_level: upper.log_level.or(self.log_level),
            task_store_url: upper.task_store_url.or(self.task_store_url),
            worker_id: upper.worker_id.or(self.worker_id),
            retrieve_timeout: upper.retrieve_timeout.or(self.retrieve_timeout),
            max_backoff_round_exponent: upper
                .max_backoff_round_exponent
                .or(self.max_backoff_round_exponent),
        }
    }
}

impl From<&CliArgs> for RawWorkerConfig {
    /// Values clap collected from flags and environment variables.
    fn from(args: &CliArgs) -> Self {
        RawWorkerConfig {
            work_dir: args.work_dir.clone(),
            log_dir: args.log_dir.clone(),
            input_dir: args.input_dir.clone(),
            output_dir: args.output_dir.clone(),
            probe_interval: args.probe_interval,
            number_of_retries: args.number_of_retries,
            backoff_seed: args.backoff_seed,
            wait_for_input_files: args.wait_for_input_files,
            file_watch_num_retries: args.file_watch_num_retries,
            enable_network_monitor: args.enable_network_monitor,
            log_level: args.log_level.map(|l| l.as_str().to_string()),
            task_store_url: args.task_store_url.clone(),
            worker_id: args.worker_id.clone(),
            retrieve_timeout: args.retrieve_timeout,
            max_backoff_round_exponent: args.max_backoff_round_exponent,
        }
    }
}

/// Validated worker configuration.
///
/// Built from [`RawWorkerConfig`] via `TryFrom` (see `validate.rs`); all
/// directories are absolute and every default is filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub work_dir: PathBuf,
    pub log_dir: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub probe_interval: Duration,
    pub number_of_retries: u32,
    pub backoff_seed: Duration,
    pub wait_for_input_files: bool,
    pub file_watch_num_retries: u32,
    pub enable_network_monitor: bool,
    pub log_level: LogLevel,
    pub task_store_url: String,
    pub worker_id: InstanceId,
    pub retrieve_timeout: Duration,
    pub max_backoff_round_exponent: u32,
}

impl WorkerConfig {
    pub fn executor_options(&self, paths: &TaskLogPaths) -> ExecutorOptions {
        ExecutorOptions {
            work_dir: self.work_dir.clone(),
            stdout_log: paths.stdout.clone(),
            stderr_log: paths.stderr.clone(),
            retries: self.number_of_retries,
            backoff_seed: self.backoff_seed,
            monitor: MonitorOptions::new(self.probe_interval),
        }
    }

    pub fn orchestrator_options(&self, paths: &TaskLogPaths) -> OrchestratorOptions {
        OrchestratorOptions {
            retrieve_timeout: self.retrieve_timeout,
            wait_for_inputs: self.wait_for_input_files,
            file_watch_retries: self.file_watch_num_retries,
            max_backoff_round_exponent: self.max_backoff_round_exponent,
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            network_monitor: self
                .enable_network_monitor
                .then(|| NetworkMonitorOptions::nethogs(&paths.netmon, self.probe_interval)),
        }
    }
}
