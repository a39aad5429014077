use std::future::Future;

use crate::error::AppError;
use crate::models::ProductRecord;

/// Fetches page content for a URL.
///
/// Implementations enforce their own timeout. Any error is treated as a
/// fetch failure for that URL and is never retried.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns page content into product fields.
///
/// Infallible: anything not found on the page is reported as
/// [`NOT_AVAILABLE`](crate::models::NOT_AVAILABLE).
pub trait Extractor: Send + Sync + Clone {
    fn extract(&self, html: &str) -> ProductRecord;
}
