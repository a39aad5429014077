use std::collections::BTreeMap;

use crate::error::AppError;
use crate::keys::KeySpace;
use crate::models::WorkerStatus;
use crate::store::CoordinationStore;

/// Worker identity → current activity.
///
/// Entries are overwritten on every transition and never expire, so a
/// crashed worker keeps its last status.
#[derive(Debug, Clone)]
pub struct WorkerRegistry<S: CoordinationStore> {
    store: S,
    key: String,
}

impl<S: CoordinationStore> WorkerRegistry<S> {
    pub fn new(store: S, keys: &KeySpace) -> Self {
        Self {
            store,
            key: keys.workers(),
        }
    }

    pub async fn set_status(&self, worker_id: &str, status: &WorkerStatus) -> Result<(), AppError> {
        self.store
            .hash_set(&self.key, worker_id, status.as_str())
            .await
    }

    pub async fn all(&self) -> Result<BTreeMap<String, String>, AppError> {
        let raw = self.store.hash_get_all(&self.key).await?;
        Ok(raw.into_iter().collect())
    }
}
