use std::collections::HashMap;
use std::time::Duration;

use fanout_core::error::AppError;
use fanout_core::memory::InMemoryStore;
use fanout_core::store::CoordinationStore;

use crate::config::StoreConfig;
use crate::redis_store::RedisStore;

/// Store backend chosen at startup by the binaries.
#[derive(Clone)]
pub enum Store {
    Redis(RedisStore),
    /// Process-local; only useful when coordinator and workers share a process.
    Memory(InMemoryStore),
}

impl Store {
    pub async fn redis(config: &StoreConfig) -> Result<Self, AppError> {
        Ok(Store::Redis(RedisStore::connect(config).await?))
    }

    pub fn memory() -> Self {
        Store::Memory(InMemoryStore::new())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Redis(_) => "redis",
            Store::Memory(_) => "memory",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Store::Redis($store) => $call.await,
            Store::Memory($store) => $call.await,
        }
    };
}

impl CoordinationStore for Store {
    async fn pop_blocking(&self, key: &str, timeout: Duration) -> Result<Option<String>, AppError> {
        dispatch!(self, s => s.pop_blocking(key, timeout))
    }

    async fn list_append(&self, key: &str, value: &str) -> Result<u64, AppError> {
        dispatch!(self, s => s.list_append(key, value))
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError> {
        dispatch!(self, s => s.list_range(key, start, stop))
    }

    async fn list_len(&self, key: &str) -> Result<u64, AppError> {
        dispatch!(self, s => s.list_len(key))
    }

    async fn set_add_if_absent(&self, key: &str, member: &str) -> Result<bool, AppError> {
        dispatch!(self, s => s.set_add_if_absent(key, member))
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, AppError> {
        dispatch!(self, s => s.set_contains(key, member))
    }

    async fn set_len(&self, key: &str) -> Result<u64, AppError> {
        dispatch!(self, s => s.set_len(key))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), AppError> {
        dispatch!(self, s => s.hash_set(key, field, value))
    }

    async fn hash_set_many(&self, key: &str, fields: &[(&str, String)]) -> Result<(), AppError> {
        dispatch!(self, s => s.hash_set_many(key, fields))
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, AppError> {
        dispatch!(self, s => s.hash_get(key, field))
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, AppError> {
        dispatch!(self, s => s.hash_get_all(key))
    }

    async fn hash_len(&self, key: &str) -> Result<u64, AppError> {
        dispatch!(self, s => s.hash_len(key))
    }

    async fn ping(&self) -> Result<(), AppError> {
        dispatch!(self, s => s.ping())
    }
}
