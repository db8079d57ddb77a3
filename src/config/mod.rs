// src/config/mod.rs

//! Configuration loading and validation for the worker.
//!
//! Responsibilities:
//! - Define the raw and validated data model (`model.rs`).
//! - Load an optional TOML file and merge CLI/env values over it (`loader.rs`).
//! - Apply defaults and check invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load, load_from_path};
pub use model::{RawWorkerConfig, WorkerConfig};
