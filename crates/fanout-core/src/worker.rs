use tokio_util::sync::CancellationToken;

use crate::config::{CoordinationConfig, WorkerConfig};
use crate::error::AppError;
use crate::models::{PageResult, Task, WorkerStatus};
use crate::queue::{Dequeued, TaskQueue};
use crate::registry::VisitedRegistry;
use crate::results::ResultStore;
use crate::store::CoordinationStore;
use crate::traits::{Extractor, Fetcher};
use crate::workers::WorkerRegistry;

/// Events emitted by the worker for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WorkerEvent<'a> {
    Started {
        worker_id: &'a str,
    },
    Polling,
    QueueEmpty,
    MalformedTask {
        raw: &'a str,
        reason: &'a str,
    },
    AlreadyVisited {
        task: &'a Task,
    },
    UrlClaimed {
        task: &'a Task,
    },
    FetchFailed {
        url: &'a str,
        error: &'a str,
    },
    ResultStored {
        task: &'a Task,
        failed: bool,
    },
    StoreFailed {
        url: &'a str,
        error: &'a str,
    },
    ShuttingDown {
        worker_id: &'a str,
    },
    Stopped {
        worker_id: &'a str,
    },
}

/// Trait for receiving worker events (decoupled logging).
pub trait WorkerReporter: Send + Sync {
    fn report(&self, event: WorkerEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWorkerReporter;

impl WorkerReporter for TracingWorkerReporter {
    fn report(&self, event: WorkerEvent<'_>) {
        match event {
            WorkerEvent::Started { worker_id } => {
                tracing::info!(%worker_id, "Worker started");
            }
            WorkerEvent::Polling => {
                tracing::debug!("Waiting for tasks");
            }
            WorkerEvent::QueueEmpty => {
                tracing::debug!("No tasks in queue");
            }
            WorkerEvent::MalformedTask { raw, reason } => {
                tracing::warn!(%raw, %reason, "Discarding malformed task");
            }
            WorkerEvent::AlreadyVisited { task } => {
                tracing::info!(session_id = %task.session_id, url = %task.url, "URL already visited");
            }
            WorkerEvent::UrlClaimed { task } => {
                tracing::info!(session_id = %task.session_id, url = %task.url, "Crawling");
            }
            WorkerEvent::FetchFailed { url, error } => {
                tracing::warn!(%url, %error, "Fetch failed");
            }
            WorkerEvent::ResultStored { task, failed } => {
                tracing::info!(
                    session_id = %task.session_id,
                    url = %task.url,
                    %failed,
                    "Result stored"
                );
            }
            WorkerEvent::StoreFailed { url, error } => {
                tracing::error!(%url, %error, "Failed to store result");
            }
            WorkerEvent::ShuttingDown { worker_id } => {
                tracing::info!(%worker_id, "Worker shutting down");
            }
            WorkerEvent::Stopped { worker_id } => {
                tracing::info!(%worker_id, "Worker stopped");
            }
        }
    }
}

/// What a single pass through the worker loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iteration {
    /// The pop timed out on an empty queue.
    Empty,
    /// The task was malformed or its URL already claimed.
    Discarded,
    /// The URL was claimed, fetched, and its result stored.
    Processed(PageResult),
}

/// Long-running worker: dequeue, claim, fetch, extract, store, repeat.
///
/// Workers never talk to each other. The claim on the visited registry is
/// the only thing preventing two of them from processing the same URL.
pub struct WorkerService<S, F, E>
where
    S: CoordinationStore,
    F: Fetcher,
    E: Extractor,
{
    queue: TaskQueue<S>,
    registry: VisitedRegistry<S>,
    results: ResultStore<S>,
    workers: WorkerRegistry<S>,
    fetcher: F,
    extractor: E,
    config: WorkerConfig,
}

impl<S, F, E> WorkerService<S, F, E>
where
    S: CoordinationStore,
    F: Fetcher,
    E: Extractor,
{
    pub fn new(
        store: S,
        coordination: &CoordinationConfig,
        fetcher: F,
        extractor: E,
        config: WorkerConfig,
    ) -> Self {
        let keys = &coordination.keys;
        Self {
            queue: TaskQueue::new(store.clone(), keys),
            registry: VisitedRegistry::new(store.clone(), keys, coordination.dedup_scope),
            results: ResultStore::new(store.clone(), keys),
            workers: WorkerRegistry::new(store, keys),
            fetcher,
            extractor,
            config,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.config.worker_id
    }

    /// Run the worker loop until cancellation.
    ///
    /// Cancellation is observed between iterations and during the idle
    /// backoff, never in the middle of a pop or a fetch.
    pub async fn run<WR: WorkerReporter>(
        &self,
        cancel_token: CancellationToken,
        reporter: &WR,
    ) -> Result<(), AppError> {
        reporter.report(WorkerEvent::Started {
            worker_id: &self.config.worker_id,
        });
        self.publish_status(&WorkerStatus::Idle).await;

        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            let backoff = match self.run_once(reporter).await {
                Ok(Iteration::Empty) => self.config.idle_backoff,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Worker iteration failed");
                    self.config.error_backoff()
                }
            };

            tokio::select! {
                () = tokio::time::sleep(backoff) => {}
                () = cancel_token.cancelled() => break,
            }
        }

        reporter.report(WorkerEvent::ShuttingDown {
            worker_id: &self.config.worker_id,
        });
        self.publish_status(&WorkerStatus::Idle).await;
        reporter.report(WorkerEvent::Stopped {
            worker_id: &self.config.worker_id,
        });

        Ok(())
    }

    /// One pass: pop at most one task and carry it to a stored result or a discard.
    ///
    /// Errors are store failures only; everything that can go wrong with the
    /// task itself ends as `Discarded` or as a stored `Failure`.
    pub async fn run_once<WR: WorkerReporter>(&self, reporter: &WR) -> Result<Iteration, AppError> {
        reporter.report(WorkerEvent::Polling);

        let task = match self.queue.pop(self.config.pop_timeout).await? {
            None => {
                reporter.report(WorkerEvent::QueueEmpty);
                return Ok(Iteration::Empty);
            }
            Some(Dequeued::Malformed { raw, reason }) => {
                reporter.report(WorkerEvent::MalformedTask {
                    raw: &raw,
                    reason: &reason,
                });
                return Ok(Iteration::Discarded);
            }
            Some(Dequeued::Task(task)) => task,
        };

        if !self.registry.claim(&task.session_id, &task.url).await? {
            reporter.report(WorkerEvent::AlreadyVisited { task: &task });
            return Ok(Iteration::Discarded);
        }
        reporter.report(WorkerEvent::UrlClaimed { task: &task });

        let result = self.process(&task, reporter).await;
        self.publish_status(&WorkerStatus::Idle).await;

        Ok(Iteration::Processed(result))
    }

    async fn process<WR: WorkerReporter>(&self, task: &Task, reporter: &WR) -> PageResult {
        self.publish_status(&WorkerStatus::Processing(task.url.clone()))
            .await;

        let result = match self.fetcher.fetch(&task.url).await {
            Ok(html) => PageResult::Success(self.extractor.extract(&html)),
            Err(e) => {
                let error = e.to_string();
                reporter.report(WorkerEvent::FetchFailed {
                    url: &task.url,
                    error: &error,
                });
                PageResult::failure(error)
            }
        };

        match self.store_result(task, &result).await {
            Ok(()) => reporter.report(WorkerEvent::ResultStored {
                task,
                failed: result.is_failure(),
            }),
            Err(e) => reporter.report(WorkerEvent::StoreFailed {
                url: &task.url,
                error: &e.to_string(),
            }),
        }

        result
    }

    async fn store_result(&self, task: &Task, result: &PageResult) -> Result<(), AppError> {
        self.results.put(&task.session_id, &task.url, result).await?;
        if self.config.mirror_legacy_results {
            self.results.put_legacy(&task.url, result).await?;
        }
        Ok(())
    }

    async fn publish_status(&self, status: &WorkerStatus) {
        if let Err(e) = self
            .workers
            .set_status(&self.config.worker_id, status)
            .await
        {
            tracing::warn!(worker_id = %self.config.worker_id, error = %e, "Failed to publish worker status");
        }
    }
}
