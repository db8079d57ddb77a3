// src/config/validate.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;

use crate::cli::LogLevel;
use crate::config::model::{
    DEFAULT_BACKOFF_SEED_SECS, DEFAULT_FILE_WATCH_NUM_RETRIES, DEFAULT_LOG_SUBDIR,
    DEFAULT_MAX_BACKOFF_ROUND_EXPONENT, DEFAULT_NUMBER_OF_RETRIES, DEFAULT_PROBE_INTERVAL_MS,
    DEFAULT_TASK_STORE_URL, RawWorkerConfig, WorkerConfig,
};
use crate::errors::{Result, WorkerError};
use crate::types::InstanceId;

impl TryFrom<RawWorkerConfig> for WorkerConfig {
    type Error = crate::errors::WorkerError;

    fn try_from(raw: RawWorkerConfig) -> std::result::Result<Self, Self::Error> {
        let work_dir = absolute(raw.work_dir.unwrap_or_else(|| PathBuf::from(".")))?;
        let log_dir = resolve_dir(&work_dir, raw.log_dir, DEFAULT_LOG_SUBDIR);
        let input_dir = resolve_dir(&work_dir, raw.input_dir, "");
        let output_dir = resolve_dir(&work_dir, raw.output_dir, "");

        let probe_interval = raw.probe_interval.unwrap_or(DEFAULT_PROBE_INTERVAL_MS);
        if probe_interval == 0 {
            return Err(WorkerError::Config(
                "probe_interval must be >= 1 ms (got 0)".to_string(),
            ));
        }

        let log_level = match raw.log_level.as_deref() {
            None => LogLevel::default(),
            Some(s) => parse_log_level(s)?,
        };

        let task_store_url = raw
            .task_store_url
            .unwrap_or_else(|| DEFAULT_TASK_STORE_URL.to_string());
        if task_store_url.trim().is_empty() {
            return Err(WorkerError::Config("task_store_url must not be empty".to_string()));
        }

        let worker_id = match raw.worker_id {
            Some(id) if id.trim().is_empty() => {
                return Err(WorkerError::Config("worker_id must not be empty".to_string()));
            }
            Some(id) => InstanceId::new(id),
            None => InstanceId::generate(),
        };

        Ok(WorkerConfig {
            work_dir,
            log_dir,
            input_dir,
            output_dir,
            probe_interval: Duration::from_millis(probe_interval),
            number_of_retries: raw.number_of_retries.unwrap_or(DEFAULT_NUMBER_OF_RETRIES),
            backoff_seed: Duration::from_secs(
                raw.backoff_seed.unwrap_or(DEFAULT_BACKOFF_SEED_SECS),
            ),
            wait_for_input_files: raw.wait_for_input_files.unwrap_or(false),
            file_watch_num_retries: raw
                .file_watch_num_retries
                .unwrap_or(DEFAULT_FILE_WATCH_NUM_RETRIES),
            enable_network_monitor: raw.enable_network_monitor.unwrap_or(false),
            log_level,
            task_store_url,
            worker_id,
            retrieve_timeout: Duration::from_secs(raw.retrieve_timeout.unwrap_or(0)),
            max_backoff_round_exponent: raw
                .max_backoff_round_exponent
                .unwrap_or(DEFAULT_MAX_BACKOFF_ROUND_EXPONENT),
        })
    }
}

fn parse_log_level(s: &str) -> Result<LogLevel> {
    LogLevel::from_str(s.trim(), true).map_err(|_| {
        WorkerError::Config(format!(
            "unknown log level '{s}' (expected error, warn, info, debug or trace)"
        ))
    })
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| WorkerError::Config(format!("cannot resolve current directory: {e}")))?;
    Ok(cwd.join(path))
}

/// Relative directories hang off the work dir; `None` means `default_sub`
/// inside it.
fn resolve_dir(work_dir: &Path, dir: Option<PathBuf>, default_sub: &str) -> PathBuf {
    match dir {
        Some(dir) => work_dir.join(dir),
        None if default_sub.is_empty() => work_dir.to_path_buf(),
        None => work_dir.join(default_sub),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_in(dir: &str) -> RawWorkerConfig {
        RawWorkerConfig {
            work_dir: Some(PathBuf::from(dir)),
            ..RawWorkerConfig::default()
        }
    }

    #[test]
    fn defaults_are_filled_in() {
        let cfg = WorkerConfig::try_from(raw_in("/srv/wf")).unwrap();

        assert_eq!(cfg.work_dir, PathBuf::from("/srv/wf"));
        assert_eq!(cfg.log_dir, PathBuf::from("/srv/wf/logs"));
        assert_eq!(cfg.input_dir, PathBuf::from("/srv/wf"));
        assert_eq!(cfg.output_dir, PathBuf::from("/srv/wf"));
        assert_eq!(cfg.probe_interval, Duration::from_millis(2000));
        assert_eq!(cfg.number_of_retries, 1);
        assert_eq!(cfg.backoff_seed, Duration::from_secs(10));
        assert!(!cfg.wait_for_input_files);
        assert_eq!(cfg.file_watch_num_retries, 10);
        assert!(!cfg.enable_network_monitor);
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert_eq!(cfg.task_store_url, "redis://127.0.0.1:6379");
        assert_eq!(cfg.retrieve_timeout, Duration::ZERO);
        assert_eq!(cfg.max_backoff_round_exponent, 16);
        assert!(!cfg.worker_id.as_str().is_empty());
    }

    #[test]
    fn relative_dirs_resolve_against_work_dir() {
        let raw = RawWorkerConfig {
            log_dir: Some(PathBuf::from("l")),
            input_dir: Some(PathBuf::from("/abs/in")),
            output_dir: Some(PathBuf::from("out")),
            ..raw_in("/srv/wf")
        };
        let cfg = WorkerConfig::try_from(raw).unwrap();

        assert_eq!(cfg.log_dir, PathBuf::from("/srv/wf/l"));
        assert_eq!(cfg.input_dir, PathBuf::from("/abs/in"));
        assert_eq!(cfg.output_dir, PathBuf::from("/srv/wf/out"));
    }

    #[test]
    fn zero_probe_interval_is_rejected() {
        let raw = RawWorkerConfig {
            probe_interval: Some(0),
            ..raw_in("/srv/wf")
        };
        let err = WorkerConfig::try_from(raw).unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn log_level_is_case_insensitive_and_checked() {
        let ok = RawWorkerConfig {
            log_level: Some("DEBUG".to_string()),
            ..raw_in("/srv/wf")
        };
        assert_eq!(WorkerConfig::try_from(ok).unwrap().log_level, LogLevel::Debug);

        let bad = RawWorkerConfig {
            log_level: Some("loud".to_string()),
            ..raw_in("/srv/wf")
        };
        assert!(matches!(
            WorkerConfig::try_from(bad).unwrap_err(),
            WorkerError::Config(_)
        ));
    }

    #[test]
    fn explicit_worker_id_is_kept_and_blank_one_rejected() {
        let raw = RawWorkerConfig {
            worker_id: Some("node-7".to_string()),
            ..raw_in("/srv/wf")
        };
        assert_eq!(WorkerConfig::try_from(raw).unwrap().worker_id.as_str(), "node-7");

        let blank = RawWorkerConfig {
            worker_id: Some("  ".to_string()),
            ..raw_in("/srv/wf")
        };
        assert!(WorkerConfig::try_from(blank).is_err());
    }
}
