use std::time::Duration;

use fanout_core::error::AppError;
use fanout_core::traits::Fetcher;
use reqwest::{Client, StatusCode};

/// Plain HTTP fetcher using reqwest.
///
/// Only a `200 OK` counts as a page; any other final status (after redirects)
/// is reported as [`AppError::HttpStatus`].
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("Fanout/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    fn map_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AppError::NetworkError(format!("Connection failed: {e}"))
        } else {
            AppError::HttpError(e.to_string())
        }
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(%url, status = status.as_u16(), "Non-OK response");
            return Err(AppError::HttpStatus(status.as_u16()));
        }

        response.text().await.map_err(|e| self.map_error(e))
    }
}
