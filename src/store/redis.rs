// src/store/redis.rs

use std::time::Duration;

use ::redis::AsyncCommands;
use ::redis::aio::MultiplexedConnection;
use async_trait::async_trait;
use tracing::info;

use super::TaskStore;
use crate::errors::Result;

/// Task store backed by a Redis server.
///
/// The non-destructive read is `BRPOPLPUSH <queue> <queue>`: the message is
/// rotated back onto the same list, so it stays available for redelivery if
/// this worker dies before the task completes.
#[derive(Clone)]
pub struct RedisTaskStore {
    conn: MultiplexedConnection,
}

impl std::fmt::Debug for RedisTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTaskStore").finish_non_exhaustive()
    }
}

impl RedisTaskStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = ::redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!(url, "connected to task store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(set, member).await?;
        Ok(added > 0)
    }

    async fn srem(&self, set: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.srem(set, member).await?;
        Ok(removed > 0)
    }

    async fn sismember(&self, set: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let present: bool = conn.sismember(set, member).await?;
        Ok(present)
    }

    async fn push(&self, queue: &str, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _len: i64 = conn.lpush(queue, payload).await?;
        Ok(())
    }

    async fn pop_requeue(&self, queue: &str, timeout: Duration) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let msg: Option<String> = ::redis::cmd("BRPOPLPUSH")
            .arg(queue)
            .arg(queue)
            .arg(blocking_timeout_secs(timeout))
            .query_async(&mut conn)
            .await?;
        Ok(msg)
    }
}

/// Redis takes whole seconds here, `0` meaning forever; round sub-second
/// timeouts up so they do not turn into "block forever".
fn blocking_timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs_f64().ceil() as u64
}
