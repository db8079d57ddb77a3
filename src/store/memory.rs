// src/store/memory.rs

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::TaskStore;
use crate::errors::Result;

#[derive(Debug, Default)]
struct State {
    counters: HashMap<String, i64>,
    sets: HashMap<String, HashSet<String>>,
    queues: HashMap<String, VecDeque<String>>,
}

/// In-process task store.
///
/// Cloning shares the underlying state, so a test can keep a handle to
/// inspect what the worker did.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<State>>,
    pushed: Arc<Notify>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter (0 if never incremented).
    pub fn counter(&self, key: &str) -> i64 {
        let state = self.state.lock().unwrap();
        state.counters.get(key).copied().unwrap_or(0)
    }

    /// Members of a set, sorted.
    pub fn members(&self, set: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut members: Vec<String> = state
            .sets
            .get(set)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Messages of a queue, head first.
    pub fn queue(&self, queue: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .queues
            .get(queue)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn try_rotate(&self, queue: &str) -> Option<String> {
        let mut state = self.state.lock().unwrap();
        let q = state.queues.get_mut(queue)?;
        let msg = q.pop_back()?;
        q.push_front(msg.clone());
        Some(msg)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let value = state.counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn sadd(&self, set: &str, member: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn srem(&self, set: &str, member: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        Ok(state
            .sets
            .get_mut(set)
            .map(|s| s.remove(member))
            .unwrap_or(false))
    }

    async fn sismember(&self, set: &str, member: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.sets.get(set).is_some_and(|s| s.contains(member)))
    }

    async fn push(&self, queue: &str, payload: &str) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state
                .queues
                .entry(queue.to_string())
                .or_default()
                .push_front(payload.to_string());
        }
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn pop_requeue(&self, queue: &str, timeout: Duration) -> Result<Option<String>> {
        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);

        loop {
            // Register interest before checking, so a push between the check
            // and the wait is not missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(msg) = self.try_rotate(queue) {
                return Ok(Some(msg));
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }
}
