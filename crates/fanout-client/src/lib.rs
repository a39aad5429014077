pub mod extractor;
pub mod fetcher;

#[cfg(feature = "browser")]
pub mod browser_fetcher;

#[cfg(feature = "browser")]
pub use browser_fetcher::BrowserFetcher;
pub use extractor::HtmlProductExtractor;
pub use fetcher::ReqwestFetcher;
