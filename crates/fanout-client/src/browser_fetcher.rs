use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use fanout_core::error::AppError;
use fanout_core::traits::Fetcher;
use futures::StreamExt;

/// Well-known Chrome/Chromium locations, checked in order.
///
/// The snap wrapper at `/snap/bin/chromium` drops unknown flags and breaks
/// headless mode, so the real binary inside the snap comes first.
const CHROME_CANDIDATES: &[&str] = &[
    "/snap/chromium/current/usr/lib/chromium-browser/chrome",
    "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
];

/// Rendering fetcher for sites that build their content client-side.
///
/// One headless Chromium process is shared by all clones; every fetch opens
/// a tab, waits for `<body>`, reads the DOM and closes the tab.
#[derive(Clone)]
pub struct BrowserFetcher {
    browser: Arc<Browser>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Launch headless Chromium.
    ///
    /// `chrome_bin` overrides binary discovery; when absent the well-known
    /// locations are tried before leaving the lookup to `chromiumoxide`.
    pub async fn launch(timeout: Duration, chrome_bin: Option<&Path>) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        if let Some(bin) = chrome_bin.map(Path::to_path_buf).or_else(find_chrome_binary) {
            tracing::info!(chrome = %bin.display(), "Using Chrome binary");
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::ConfigError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled for the connection to make progress.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!(error = %e, "Browser CDP handler error");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            timeout,
        })
    }

    async fn render(&self, url: &str) -> Result<String, AppError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to navigate to {url}: {e}")))?;

        page.find_element("body")
            .await
            .map_err(|e| AppError::RenderError(format!("Page did not render body: {e}")))?;

        let html = page
            .content()
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to read page content: {e}")));

        if let Err(e) = page.close().await {
            tracing::debug!(%url, error = %e, "Failed to close tab");
        }

        html
    }
}

fn find_chrome_binary() -> Option<PathBuf> {
    CHROME_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        tokio::time::timeout(self.timeout, self.render(url))
            .await
            .unwrap_or(Err(AppError::Timeout(self.timeout.as_secs())))
    }
}
