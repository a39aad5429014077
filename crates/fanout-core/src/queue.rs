use std::time::Duration;

use crate::error::AppError;
use crate::keys::KeySpace;
use crate::models::Task;
use crate::store::CoordinationStore;

/// Outcome of a single pop from the task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dequeued {
    Task(Task),
    /// The entry could not be parsed; it has already been removed from the queue.
    Malformed { raw: String, reason: String },
}

/// Global FIFO of `(session_id, url)` tasks.
#[derive(Debug, Clone)]
pub struct TaskQueue<S: CoordinationStore> {
    store: S,
    key: String,
}

impl<S: CoordinationStore> TaskQueue<S> {
    pub fn new(store: S, keys: &KeySpace) -> Self {
        Self {
            store,
            key: keys.queue(),
        }
    }

    pub async fn push(&self, task: &Task) -> Result<(), AppError> {
        let payload = task.encode()?;
        self.store.list_append(&self.key, &payload).await?;
        Ok(())
    }

    /// Block up to `timeout` for the next task. `None` means the queue stayed empty.
    pub async fn pop(&self, timeout: Duration) -> Result<Option<Dequeued>, AppError> {
        let Some(raw) = self.store.pop_blocking(&self.key, timeout).await? else {
            return Ok(None);
        };

        Ok(Some(match Task::parse(&raw) {
            Ok(task) => Dequeued::Task(task),
            Err(e) => Dequeued::Malformed {
                raw,
                reason: e.to_string(),
            },
        }))
    }

    pub async fn len(&self) -> Result<u64, AppError> {
        self.store.list_len(&self.key).await
    }
}
