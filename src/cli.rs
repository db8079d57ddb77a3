// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every option can also be given through the environment variable named in
//! its `env` attribute; flags win over the environment, which wins over the
//! optional TOML file.

use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// Command-line arguments for `wfexec`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "wfexec",
    version,
    about = "Run one workflow task: fetch its job, execute it with retries, report completion.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to handle, e.g. `task:wf1:0`.
    #[arg(value_name = "TASK_ID")]
    pub task_id: String,

    /// Optional config file (TOML).
    #[arg(long, env = "WFEXEC_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory of the job process.
    #[arg(long, env = "WORK_DIR", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Directory for the per-task log files.
    #[arg(long, env = "LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Base directory of relative input paths.
    #[arg(long, env = "INPUT_DIR", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Base directory of relative output paths.
    #[arg(long, env = "OUTPUT_DIR", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Resource sampling interval in milliseconds.
    #[arg(long, env = "PROBE_INTERVAL", value_name = "MS")]
    pub probe_interval: Option<u64>,

    /// How many times a failed job is retried.
    #[arg(long, env = "NUMBER_OF_RETRIES", value_name = "N")]
    pub number_of_retries: Option<u32>,

    /// Backoff seed in seconds.
    #[arg(long, env = "BACKOFF_SEED", value_name = "SECS")]
    pub backoff_seed: Option<u64>,

    /// Wait for the job's input files before running it.
    #[arg(long, env = "WAIT_FOR_INPUT_FILES", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub wait_for_input_files: Option<bool>,

    /// Number of extra check rounds when waiting for input files.
    #[arg(long, env = "FILE_WATCH_NUM_RETRIES", value_name = "N")]
    pub file_watch_num_retries: Option<u32>,

    /// Run an external network monitor alongside the job.
    #[arg(long, env = "ENABLE_NETWORK_MONITOR", value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub enable_network_monitor: Option<bool>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// `RUST_LOG`, if set, overrides this with a full filter directive.
    #[arg(long, env = "LOG_LEVEL", value_enum, ignore_case = true, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Task store address.
    #[arg(long, env = "TASK_STORE_URL", value_name = "URL")]
    pub task_store_url: Option<String>,

    /// Worker instance id (generated when omitted).
    #[arg(long, env = "WORKER_ID", value_name = "ID")]
    pub worker_id: Option<String>,

    /// Seconds to wait for the job message; 0 waits forever.
    #[arg(long, env = "RETRIEVE_TIMEOUT", value_name = "SECS")]
    pub retrieve_timeout: Option<u64>,

    /// Cap on the exponent of the input-wait backoff.
    #[arg(long, env = "MAX_BACKOFF_ROUND_EXPONENT", value_name = "N")]
    pub max_backoff_round_exponent: Option<u32>,
}

/// Log level as exposed on the CLI and in the config file.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
