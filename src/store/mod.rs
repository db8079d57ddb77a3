// src/store/mod.rs

//! Task store port: the shared coordination backend.
//!
//! The worker only needs a handful of atomic primitives from the store:
//! counters, set membership and a blocking queue read that leaves the
//! message in place. Every call is a single atomic store operation, so the
//! worker never takes locks of its own around them.
//!
//! - [`memory`] is an in-process implementation for tests and local runs.
//! - [`redis`] talks to a Redis server.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::Result;

pub mod keys;
pub mod memory;
pub mod redis;

pub use memory::InMemoryTaskStore;
pub use self::redis::RedisTaskStore;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Atomically increment `key` and return the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Add `member` to `set`; returns `true` if it was not present before.
    async fn sadd(&self, set: &str, member: &str) -> Result<bool>;

    /// Remove `member` from `set`; returns `true` if it was present.
    async fn srem(&self, set: &str, member: &str) -> Result<bool>;

    async fn sismember(&self, set: &str, member: &str) -> Result<bool>;

    /// Push `payload` onto the head of `queue`.
    async fn push(&self, queue: &str, payload: &str) -> Result<()>;

    /// Block until `queue` holds a message, then atomically take it from the
    /// tail and put it back on the head of the same queue.
    ///
    /// `timeout == Duration::ZERO` blocks indefinitely. `Ok(None)` means the
    /// timeout elapsed without a message.
    async fn pop_requeue(&self, queue: &str, timeout: Duration) -> Result<Option<String>>;
}
