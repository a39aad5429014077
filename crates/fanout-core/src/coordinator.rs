use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CoordinationConfig;
use crate::error::AppError;
use crate::models::{PageResult, Session, Task};
use crate::queue::TaskQueue;
use crate::registry::VisitedRegistry;
use crate::results::ResultStore;
use crate::sessions::SessionStore;
use crate::store::CoordinationStore;
use crate::workers::WorkerRegistry;

/// Result of a URL submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub session_id: String,
    pub urls_added: usize,
    pub already_crawled: Vec<String>,
}

/// Global crawl progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub queued: u64,
    pub visited: u64,
    /// Size of the legacy global result collection.
    pub results: u64,
    pub failed: u64,
}

/// One row of the session listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub submitted: usize,
    pub completed: u64,
    pub failed: u64,
    pub start_time: DateTime<Utc>,
}

/// Stateless submission and read-side aggregation over the shared store.
///
/// Any number of coordinators may run against the same store; none of them
/// holds state between calls.
#[derive(Debug, Clone)]
pub struct Coordinator<S: CoordinationStore> {
    store: S,
    queue: TaskQueue<S>,
    registry: VisitedRegistry<S>,
    sessions: SessionStore<S>,
    results: ResultStore<S>,
    workers: WorkerRegistry<S>,
}

impl<S: CoordinationStore> Coordinator<S> {
    pub fn new(store: S, config: &CoordinationConfig) -> Self {
        let keys = &config.keys;
        Self {
            queue: TaskQueue::new(store.clone(), keys),
            registry: VisitedRegistry::new(store.clone(), keys, config.dedup_scope),
            sessions: SessionStore::new(store.clone(), keys),
            results: ResultStore::new(store.clone(), keys),
            workers: WorkerRegistry::new(store.clone(), keys),
            store,
        }
    }

    /// Open a session for `urls` and enqueue every URL not yet visited.
    ///
    /// The visited check is advisory: duplicates within one batch, or the
    /// same URL submitted concurrently, are all enqueued. Workers resolve
    /// them with the atomic claim.
    pub async fn submit(&self, urls: Vec<String>) -> Result<SubmitOutcome, AppError> {
        let session = Session::new(urls);
        self.sessions.create(&session).await?;

        let mut urls_added = 0;
        let mut already_crawled = Vec::new();
        for url in &session.urls {
            if self.registry.is_visited(&session.id, url).await? {
                already_crawled.push(url.clone());
            } else {
                self.queue.push(&Task::new(&session.id, url)).await?;
                urls_added += 1;
            }
        }

        tracing::info!(
            session_id = %session.id,
            submitted = session.submitted_count,
            urls_added,
            already_crawled = already_crawled.len(),
            "Session submitted"
        );

        Ok(SubmitOutcome {
            session_id: session.id,
            urls_added,
            already_crawled,
        })
    }

    /// Legacy process-wide result collection.
    pub async fn get_results(&self) -> Result<BTreeMap<String, PageResult>, AppError> {
        self.results.legacy_results().await
    }

    /// Results for one session; empty for an unknown session.
    pub async fn get_session_results(
        &self,
        session_id: &str,
    ) -> Result<BTreeMap<String, PageResult>, AppError> {
        self.results.session_results(session_id).await
    }

    pub async fn get_progress(&self) -> Result<Progress, AppError> {
        let queued = self.queue.len().await?;
        let visited = self.registry.len().await?;
        let counts = self.results.legacy_counts().await?;

        Ok(Progress {
            queued,
            visited,
            results: counts.total,
            failed: counts.failed,
        })
    }

    /// Every session in history order, skipping ids whose metadata is missing.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, AppError> {
        let mut summaries = Vec::new();
        for session_id in self.sessions.history().await? {
            let Some(session) = self.sessions.get(&session_id).await? else {
                continue;
            };
            let counts = self.results.session_counts(&session_id).await?;
            summaries.push(SessionSummary {
                session_id,
                submitted: session.submitted_count,
                completed: counts.total,
                failed: counts.failed,
                start_time: session.start_time,
            });
        }
        Ok(summaries)
    }

    pub async fn get_workers(&self) -> Result<BTreeMap<String, String>, AppError> {
        self.workers.all().await
    }

    /// Round-trip to the store.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.store.ping().await
    }
}
