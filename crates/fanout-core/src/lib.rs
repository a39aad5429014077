pub mod config;
pub mod coordinator;
pub mod error;
pub mod keys;
pub mod memory;
pub mod models;
pub mod queue;
pub mod registry;
pub mod results;
pub mod sessions;
pub mod store;
pub mod strategy;
pub mod traits;
pub mod worker;
pub mod workers;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::{CoordinationConfig, DedupScope, WorkerConfig};
pub use coordinator::Coordinator;
pub use error::AppError;
pub use keys::KeySpace;
pub use memory::InMemoryStore;
pub use models::{PageResult, ProductRecord, Session, SessionStatus, Task, WorkerStatus};
pub use store::CoordinationStore;
pub use strategy::{FetchRouter, FetchStrategy, StrategyRegistry};
pub use traits::{Extractor, Fetcher};
pub use worker::{Iteration, TracingWorkerReporter, WorkerEvent, WorkerReporter, WorkerService};
