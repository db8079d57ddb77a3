// src/watch/mod.rs

//! Waiting for a job's input files.
//!
//! Inputs are produced by upstream tasks, possibly on other hosts and
//! through shared storage that lags behind. Before the job is spawned the
//! worker can poll for them with a growing delay between rounds.

pub mod inputs;

pub use inputs::{InputWaiter, round_delay};
