use thiserror::Error;

/// Application-wide error types for fanout.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The target answered with a non-success status.
    #[error("HTTP {0}")]
    HttpStatus(u16),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Headless browser failed to render the page.
    #[error("Render error: {0}")]
    RenderError(String),

    /// Coordination store operation failed.
    #[error("Store error: {0}")]
    StoreError(String),

    /// A queue entry could not be parsed into a task.
    #[error("Malformed task: {0}")]
    MalformedTask(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error happened while fetching a page.
    ///
    /// Fetch failures are recorded as a `Failure` result for the URL rather
    /// than propagated.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_)
                | AppError::HttpStatus(_)
                | AppError::Timeout(_)
                | AppError::NetworkError(_)
                | AppError::RenderError(_)
        )
    }
}
