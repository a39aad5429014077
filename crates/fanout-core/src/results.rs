use std::collections::{BTreeMap, HashMap};

use crate::error::AppError;
use crate::keys::KeySpace;
use crate::models::PageResult;
use crate::store::CoordinationStore;

/// Aggregate counts over one result collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultCounts {
    pub total: u64,
    /// Entries whose decoded object carries the `error` marker. Undecodable
    /// entries are not counted.
    pub failed: u64,
}

/// Result collections: one per session, plus the legacy global one.
#[derive(Debug, Clone)]
pub struct ResultStore<S: CoordinationStore> {
    store: S,
    keys: KeySpace,
}

impl<S: CoordinationStore> ResultStore<S> {
    pub fn new(store: S, keys: &KeySpace) -> Self {
        Self {
            store,
            keys: keys.clone(),
        }
    }

    /// Write a session-scoped result. Rewriting the same URL overwrites.
    pub async fn put(&self, session_id: &str, url: &str, result: &PageResult) -> Result<(), AppError> {
        let payload = result.encode()?;
        self.store
            .hash_set(&self.keys.session_results(session_id), url, &payload)
            .await
    }

    pub async fn put_legacy(&self, url: &str, result: &PageResult) -> Result<(), AppError> {
        let payload = result.encode()?;
        self.store
            .hash_set(&self.keys.legacy_results(), url, &payload)
            .await
    }

    pub async fn session_results(
        &self,
        session_id: &str,
    ) -> Result<BTreeMap<String, PageResult>, AppError> {
        let raw = self
            .store
            .hash_get_all(&self.keys.session_results(session_id))
            .await?;
        Ok(decode_all(raw))
    }

    pub async fn legacy_results(&self) -> Result<BTreeMap<String, PageResult>, AppError> {
        let raw = self.store.hash_get_all(&self.keys.legacy_results()).await?;
        Ok(decode_all(raw))
    }

    pub async fn session_counts(&self, session_id: &str) -> Result<ResultCounts, AppError> {
        let raw = self
            .store
            .hash_get_all(&self.keys.session_results(session_id))
            .await?;
        Ok(count(&raw))
    }

    pub async fn legacy_counts(&self) -> Result<ResultCounts, AppError> {
        let raw = self.store.hash_get_all(&self.keys.legacy_results()).await?;
        Ok(count(&raw))
    }
}

fn decode_all(raw: HashMap<String, String>) -> BTreeMap<String, PageResult> {
    raw.into_iter()
        .map(|(url, payload)| {
            let result = PageResult::decode_lossy(&payload);
            (url, result)
        })
        .collect()
}

fn count(raw: &HashMap<String, String>) -> ResultCounts {
    let failed = raw
        .values()
        .filter(|payload| PageResult::has_failure_marker(payload))
        .count();
    ResultCounts {
        total: raw.len() as u64,
        failed: failed as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::models::ProductRecord;

    #[tokio::test]
    async fn test_put_overwrites_per_url() {
        let results = ResultStore::new(InMemoryStore::new(), &KeySpace::default());

        results
            .put("s1", "http://x.com/a", &PageResult::failure("HTTP 500"))
            .await
            .unwrap();
        results
            .put(
                "s1",
                "http://x.com/a",
                &PageResult::Success(ProductRecord::not_available()),
            )
            .await
            .unwrap();

        let map = results.session_results("s1").await.unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(
            map["http://x.com/a"],
            PageResult::Success(ProductRecord::not_available())
        );
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_from_legacy() {
        let results = ResultStore::new(InMemoryStore::new(), &KeySpace::default());
        results
            .put("s1", "http://x.com/a", &PageResult::failure("boom"))
            .await
            .unwrap();

        assert!(results.legacy_results().await.unwrap().is_empty());
        assert!(results.session_results("s2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counts_skip_undecodable_entries() {
        let store = InMemoryStore::new();
        let keys = KeySpace::default();
        let results = ResultStore::new(store.clone(), &keys);

        results
            .put_legacy("http://x.com/ok", &PageResult::Success(ProductRecord::not_available()))
            .await
            .unwrap();
        results
            .put_legacy("http://x.com/bad", &PageResult::failure("HTTP 404"))
            .await
            .unwrap();
        store
            .hash_set(&keys.legacy_results(), "http://x.com/junk", "{{{")
            .await
            .unwrap();

        let counts = results.legacy_counts().await.unwrap();
        assert_eq!(counts, ResultCounts { total: 3, failed: 1 });

        // Junk still surfaces, as a synthetic failure carrying the raw value.
        let map = results.legacy_results().await.unwrap();
        assert_eq!(map["http://x.com/junk"], PageResult::failure("{{{"));
    }

    #[tokio::test]
    async fn test_counts_agree_with_decoded_failures() {
        let store = InMemoryStore::new();
        let keys = KeySpace::default();
        let results = ResultStore::new(store.clone(), &keys);
        let key = keys.session_results("s1");

        store.hash_set(&key, "http://x.com/a", r#"{"error": 500}"#).await.unwrap();
        store
            .hash_set(&key, "http://x.com/b", r#""{\"error\": \"HTTP 404\"}""#)
            .await
            .unwrap();
        results
            .put("s1", "http://x.com/c", &PageResult::Success(ProductRecord::not_available()))
            .await
            .unwrap();

        let counts = results.session_counts("s1").await.unwrap();
        assert_eq!(counts, ResultCounts { total: 3, failed: 2 });

        let map = results.session_results("s1").await.unwrap();
        assert!(map["http://x.com/a"].is_failure());
        assert_eq!(map["http://x.com/b"], PageResult::failure("HTTP 404"));
    }
}
