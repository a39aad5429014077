use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Shared key-value/queue/set/hash service all processes coordinate through.
///
/// Implementations only guarantee per-key atomicity; there are no
/// cross-key transactions. [`set_add_if_absent`](Self::set_add_if_absent)
/// is the single primitive the at-most-once claim relies on and must be
/// atomic across every client of the store.
pub trait CoordinationStore: Send + Sync + Clone {
    /// Pop the head of a list, blocking up to `timeout`.
    ///
    /// Returns `None` on timeout.
    fn pop_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// Append to the tail of a list. Returns the new length.
    fn list_append(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Inclusive range with Redis index semantics (`-1` is the last element).
    fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    fn list_len(&self, key: &str) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Add `member` to a set. Returns `true` only if this call added it.
    fn set_add_if_absent(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn set_contains(
        &self,
        key: &str,
        member: &str,
    ) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn set_len(&self, key: &str) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn hash_set(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Write several fields of one hash in a single atomic operation.
    fn hash_set_many(
        &self,
        key: &str,
        fields: &[(&str, String)],
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn hash_get(
        &self,
        key: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    /// All fields of a hash; empty if the key does not exist.
    fn hash_get_all(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<HashMap<String, String>, AppError>> + Send;

    fn hash_len(&self, key: &str) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Cheap round-trip used by health checks.
    fn ping(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}
