use crate::config::DedupScope;
use crate::error::AppError;
use crate::keys::KeySpace;
use crate::store::CoordinationStore;

/// Set of URLs already claimed for processing.
///
/// [`claim`](Self::claim) is the only correctness-critical operation in the
/// system: exactly one caller observes `true` for a given URL (per session,
/// under [`DedupScope::PerSession`]).
#[derive(Debug, Clone)]
pub struct VisitedRegistry<S: CoordinationStore> {
    store: S,
    keys: KeySpace,
    scope: DedupScope,
}

impl<S: CoordinationStore> VisitedRegistry<S> {
    pub fn new(store: S, keys: &KeySpace, scope: DedupScope) -> Self {
        Self {
            store,
            keys: keys.clone(),
            scope,
        }
    }

    pub fn scope(&self) -> DedupScope {
        self.scope
    }

    fn claim_key(&self, session_id: &str) -> String {
        match self.scope {
            DedupScope::Global => self.keys.visited(),
            DedupScope::PerSession => self.keys.session_visited(session_id),
        }
    }

    /// Atomically take ownership of `url`. Returns `false` if it was already claimed.
    pub async fn claim(&self, session_id: &str, url: &str) -> Result<bool, AppError> {
        let claimed = self
            .store
            .set_add_if_absent(&self.claim_key(session_id), url)
            .await?;

        // The global set doubles as the "ever visited" record for progress.
        if claimed && self.scope == DedupScope::PerSession {
            self.store
                .set_add_if_absent(&self.keys.visited(), url)
                .await?;
        }

        Ok(claimed)
    }

    /// Advisory membership test. Races with concurrent claims.
    pub async fn is_visited(&self, session_id: &str, url: &str) -> Result<bool, AppError> {
        self.store
            .set_contains(&self.claim_key(session_id), url)
            .await
    }

    /// Number of distinct URLs ever claimed.
    pub async fn len(&self) -> Result<u64, AppError> {
        self.store.set_len(&self.keys.visited()).await
    }
}
