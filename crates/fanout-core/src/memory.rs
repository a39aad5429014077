//! Process-local [`CoordinationStore`].
//!
//! Backs unit tests and single-process runs. All clones share the same
//! state, so a coordinator and several workers in one process coordinate
//! exactly as they would through Redis.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::AppError;
use crate::store::CoordinationStore;

#[derive(Debug, Default)]
struct State {
    lists: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, HashSet<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

/// In-memory store with the same per-key atomicity as Redis.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    pushed: Arc<Notify>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::StoreError("in-memory store lock poisoned".into()))
    }

    fn pop_front(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut state = self.state()?;
        Ok(state.lists.get_mut(key).and_then(VecDeque::pop_front))
    }
}

/// Stand-in deadline for timeouts too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Resolve Redis-style inclusive, possibly negative, indices against `len`.
fn range_bounds(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

impl CoordinationStore for InMemoryStore {
    async fn pop_blocking(&self, key: &str, timeout: Duration) -> Result<Option<String>, AppError> {
        let now = tokio::time::Instant::now();
        let deadline = now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE);
        loop {
            // Registered before checking so a push in between is not missed.
            let notified = self.pushed.notified();
            if let Some(value) = self.pop_front(key)? {
                return Ok(Some(value));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn list_append(&self, key: &str, value: &str) -> Result<u64, AppError> {
        let len = {
            let mut state = self.state()?;
            let list = state.lists.entry(key.to_string()).or_default();
            list.push_back(value.to_string());
            list.len() as u64
        };
        self.pushed.notify_waiters();
        Ok(len)
    }

    async fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, AppError> {
        let state = self.state()?;
        let Some(list) = state.lists.get(key) else {
            return Ok(Vec::new());
        };
        Ok(match range_bounds(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn list_len(&self, key: &str) -> Result<u64, AppError> {
        let state = self.state()?;
        Ok(state.lists.get(key).map_or(0, |l| l.len() as u64))
    }

    async fn set_add_if_absent(&self, key: &str, member: &str) -> Result<bool, AppError> {
        let mut state = self.state()?;
        Ok(state
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, AppError> {
        let state = self.state()?;
        Ok(state.sets.get(key).is_some_and(|s| s.contains(member)))
    }

    async fn set_len(&self, key: &str) -> Result<u64, AppError> {
        let state = self.state()?;
        Ok(state.sets.get(key).map_or(0, |s| s.len() as u64))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), AppError> {
        let mut state = self.state()?;
        state
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_set_many(&self, key: &str, fields: &[(&str, String)]) -> Result<(), AppError> {
        let mut state = self.state()?;
        let hash = state.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.to_string(), value.clone());
        }
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, AppError> {
        let state = self.state()?;
        Ok(state.hashes.get(key).and_then(|h| h.get(field)).cloned())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, AppError> {
        let state = self.state()?;
        Ok(state.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hash_len(&self, key: &str) -> Result<u64, AppError> {
        let state = self.state()?;
        Ok(state.hashes.get(key).map_or(0, |h| h.len() as u64))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.state().map(|_| ())
    }
}
