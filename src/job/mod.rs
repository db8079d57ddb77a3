// src/job/mod.rs

//! Job descriptors: what to run for a task.
//!
//! - [`descriptor`] holds the wire model and its validated form.
//! - [`retrieve`] fetches the descriptor from the task store without
//!   consuming it.

pub mod descriptor;
pub mod retrieve;

pub use descriptor::{FileRef, JobDescriptor, OutputTarget, RawJobDescriptor};
pub use retrieve::retrieve;
