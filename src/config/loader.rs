// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{RawWorkerConfig, WorkerConfig};
use crate::errors::Result;

/// Read a TOML config file into a `RawWorkerConfig`.
///
/// Only deserializes; defaults and checks are applied by
/// `WorkerConfig::try_from`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkerConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawWorkerConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Build the effective configuration for this run.
///
/// Layers, lowest first: built-in defaults, the `--config` file (if any),
/// then whatever clap collected from environment variables and flags.
pub fn load(args: &CliArgs) -> Result<WorkerConfig> {
    let file = match &args.config {
        Some(path) => load_from_path(path)?,
        None => RawWorkerConfig::default(),
    };
    let merged = file.overlay(RawWorkerConfig::from(args));
    WorkerConfig::try_from(merged)
}
