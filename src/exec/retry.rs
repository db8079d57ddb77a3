// src/exec/retry.rs

//! Retry bookkeeping and backoff for the process executor.

use std::time::Duration;

use rand::Rng;

/// Backoff multiplier stops growing after this many attempts.
pub const MAX_BACKOFF_ATTEMPT_FACTOR: u32 = 5;

/// Random delay before retrying after attempt `attempt` failed.
///
/// Whole seconds drawn uniformly from `[0, seed_secs * min(attempt, 5))`;
/// an empty range (seed 0) yields no delay.
pub fn backoff_delay(attempt: u32, seed_secs: u64, rng: &mut impl Rng) -> Duration {
    let upper = seed_secs.saturating_mul(u64::from(attempt.min(MAX_BACKOFF_ATTEMPT_FACTOR)));
    if upper == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs(rng.gen_range(0..upper))
}

/// Retry state of one task-handling run.
///
/// Owned by the executor for the duration of the run; nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    remaining_retries: u32,
    backoff_seed_secs: u64,
}

impl RetryState {
    pub fn new(retries: u32, backoff_seed_secs: u64) -> Self {
        Self {
            attempt: 1,
            remaining_retries: retries,
            backoff_seed_secs,
        }
    }

    /// Current attempt number, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn remaining_retries(&self) -> u32 {
        self.remaining_retries
    }

    pub fn is_first_attempt(&self) -> bool {
        self.attempt == 1
    }

    /// Record a failed attempt.
    ///
    /// Returns the delay before the next attempt, or `None` when the retry
    /// budget is used up and the failure is final.
    pub fn on_failure(&mut self, rng: &mut impl Rng) -> Option<Duration> {
        if self.remaining_retries == 0 {
            return None;
        }
        self.remaining_retries -= 1;
        let delay = backoff_delay(self.attempt, self.backoff_seed_secs, rng);
        self.attempt += 1;
        Some(delay)
    }
}
