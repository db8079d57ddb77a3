// src/watch/inputs.rs

//! Input readiness waiter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::{Result, WorkerError};
use crate::fs::{FileState, FileSystem};

/// Delay before the next check round: `2^round + 1000` milliseconds, with the
/// exponent capped at `max_exponent`.
pub fn round_delay(round: u32, max_exponent: u32) -> Duration {
    let exponent = round.min(max_exponent).min(62);
    Duration::from_millis((1u64 << exponent) + 1000)
}

/// Polls for a set of files until they all exist or the round budget runs
/// out.
///
/// A file that has been seen once is moved to the ready set and never looked
/// at again, even if it disappears later.
#[derive(Debug, Clone)]
pub struct InputWaiter {
    fs: Arc<dyn FileSystem>,
    max_retries: u32,
    max_exponent: u32,
}

impl InputWaiter {
    pub fn new(fs: Arc<dyn FileSystem>, max_retries: u32, max_exponent: u32) -> Self {
        Self {
            fs,
            max_retries,
            max_exponent,
        }
    }

    /// Wait until every path in `files` exists.
    ///
    /// Performs at most `max_retries + 1` check rounds. Returns
    /// [`WorkerError::InputTimeout`] listing the files still missing after the
    /// last round. IO errors other than "not found" abort immediately.
    pub async fn wait_for_inputs(&self, files: &[PathBuf]) -> Result<()> {
        let mut watching: Vec<PathBuf> = Vec::with_capacity(files.len());
        for f in files {
            if !watching.contains(f) {
                watching.push(f.clone());
            }
        }
        let mut ready: Vec<PathBuf> = Vec::with_capacity(watching.len());
        let mut round: u32 = 0;

        loop {
            let mut still_missing = Vec::new();
            for path in watching.drain(..) {
                match self.fs.stat(&path)? {
                    FileState::Present { size } => {
                        debug!(path = ?path, size, round, "input file ready");
                        ready.push(path);
                    }
                    FileState::Missing => still_missing.push(path),
                }
            }
            watching = still_missing;

            if watching.is_empty() {
                info!(files = ready.len(), rounds = round + 1, "all input files ready");
                return Ok(());
            }

            if round >= self.max_retries {
                warn!(
                    missing = ?watching,
                    rounds = round + 1,
                    "input files did not appear in time"
                );
                return Err(WorkerError::InputTimeout {
                    missing: watching,
                    rounds: round + 1,
                });
            }

            let delay = round_delay(round, self.max_exponent);
            debug!(
                missing = watching.len(),
                ready = ready.len(),
                round,
                ?delay,
                "waiting for input files"
            );
            sleep(delay).await;
            round += 1;
        }
    }
}
