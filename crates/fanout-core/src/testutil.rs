//! Test utilities: mock implementations of the fetch and extract capabilities.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::ProductRecord;
use crate::traits::{Extractor, Fetcher};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum MockResponse {
    Html(String),
    Status(u16),
    Timeout,
}

impl MockResponse {
    fn into_result(self) -> Result<String, AppError> {
        match self {
            MockResponse::Html(html) => Ok(html),
            MockResponse::Status(code) => Err(AppError::HttpStatus(code)),
            MockResponse::Timeout => Err(AppError::Timeout(10)),
        }
    }
}

/// Mock fetcher with a default page and per-URL overrides.
#[derive(Clone)]
pub struct MockFetcher {
    default: MockResponse,
    pages: Arc<Mutex<HashMap<String, MockResponse>>>,
    calls: Arc<Mutex<Vec<String>>>,
    delay: Duration,
}

impl MockFetcher {
    /// Returns `html` for every URL without an override.
    pub fn new(html: &str) -> Self {
        Self {
            default: MockResponse::Html(html.to_string()),
            pages: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: Duration::ZERO,
        }
    }

    /// Fails every URL without an override with the given HTTP status.
    pub fn with_status(code: u16) -> Self {
        Self {
            default: MockResponse::Status(code),
            ..Self::new("")
        }
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.respond(url, MockResponse::Html(html.to_string()))
    }

    pub fn status(self, url: &str, code: u16) -> Self {
        self.respond(url, MockResponse::Status(code))
    }

    pub fn timeout(self, url: &str) -> Self {
        self.respond(url, MockResponse::Timeout)
    }

    /// Sleep before answering, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn respond(self, url: &str, response: MockResponse) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), response);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let response = self
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        response.into_result()
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that returns a fixed record and records its inputs.
#[derive(Clone)]
pub struct MockExtractor {
    record: ProductRecord,
    pub inputs: Arc<Mutex<Vec<String>>>,
}

impl MockExtractor {
    pub fn new(record: ProductRecord) -> Self {
        Self {
            record,
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Extractor that names every product `name` and leaves the rest unavailable.
    pub fn named(name: &str) -> Self {
        Self::new(ProductRecord {
            name: name.to_string(),
            ..ProductRecord::not_available()
        })
    }
}

impl Extractor for MockExtractor {
    fn extract(&self, html: &str) -> ProductRecord {
        self.inputs.lock().unwrap().push(html.to_string());
        self.record.clone()
    }
}
