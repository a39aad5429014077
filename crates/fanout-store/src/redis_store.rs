use std::collections::HashMap;
use std::time::Duration;

use fanout_core::error::AppError;
use fanout_core::store::CoordinationStore;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::config::StoreConfig;

/// Shortest block BLPOP is asked for; a zero timeout would block forever.
const MIN_BLOCK_SECS: f64 = 0.01;

/// Redis-backed [`CoordinationStore`].
///
/// Holds two multiplexed connections: one for ordinary commands, and one
/// reserved for BLPOP so a blocked pop never delays other commands issued
/// by the same process.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    blocking: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, AppError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::ConfigError(format!("Invalid Redis URL: {e}")))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to connect to Redis: {e}")))?;
        let blocking = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to connect to Redis: {e}")))?;

        tracing::debug!(url = %config.url, "Connected to Redis");

        Ok(Self { conn, blocking })
    }
}

fn map_redis_error(err: RedisError, key: &str) -> AppError {
    AppError::StoreError(format!("{key}: {err}"))
}

impl CoordinationStore for RedisStore {
    async fn pop_blocking(&self, key: &str, timeout: Duration) -> Result<Option<String>, AppError> {
        let popped: Option<(String, String)> = self
            .blocking
            .clone()
            .blpop(key, timeout.as_secs_f64().max(MIN_BLOCK_SECS))
            .await
            .map_err(|e| map_redis_error(e, key))?;
        Ok(popped.map(|(_, value)| value))
    }

    async fn list_append(&self, key: &str, value: &str) -> Result<u64, AppError> {
        self.conn
            .clone()
            .rpush(key, value)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, AppError> {
        self.conn
            .clone()
            .lrange(key, start, stop)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn list_len(&self, key: &str) -> Result<u64, AppError> {
        self.conn
            .clone()
            .llen(key)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn set_add_if_absent(&self, key: &str, member: &str) -> Result<bool, AppError> {
        let added: u64 = self
            .conn
            .clone()
            .sadd(key, member)
            .await
            .map_err(|e| map_redis_error(e, key))?;
        Ok(added == 1)
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, AppError> {
        self.conn
            .clone()
            .sismember(key, member)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn set_len(&self, key: &str) -> Result<u64, AppError> {
        self.conn
            .clone()
            .scard(key)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), AppError> {
        self.conn
            .clone()
            .hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn hash_set_many(&self, key: &str, fields: &[(&str, String)]) -> Result<(), AppError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.conn
            .clone()
            .hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, AppError> {
        self.conn
            .clone()
            .hget(key, field)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, AppError> {
        self.conn
            .clone()
            .hgetall(key)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn hash_len(&self, key: &str) -> Result<u64, AppError> {
        self.conn
            .clone()
            .hlen(key)
            .await
            .map_err(|e| map_redis_error(e, key))
    }

    async fn ping(&self) -> Result<(), AppError> {
        let _pong: String = redis::cmd("PING")
            .query_async(&mut self.conn.clone())
            .await
            .map_err(|e| map_redis_error(e, "PING"))?;
        Ok(())
    }
}
