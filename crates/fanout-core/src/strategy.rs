//! Fetch-strategy selection by target domain.
//!
//! Some sites only produce their content after client-side rendering. The
//! [`StrategyRegistry`] maps domain patterns to a [`FetchStrategy`], and
//! [`FetchRouter`] dispatches each URL to the matching [`Fetcher`].

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::AppError;
use crate::traits::Fetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// Plain HTTP GET.
    #[default]
    Plain,
    /// Headless-browser rendering.
    Rendered,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Plain => write!(f, "plain"),
            FetchStrategy::Rendered => write!(f, "rendered"),
        }
    }
}

/// A domain and all of its subdomains. `*.example.com` and `example.com`
/// are equivalent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPattern(String);

impl DomainPattern {
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.trim().trim_start_matches("*.").trim_start_matches('.');
        Self(pattern.to_ascii_lowercase())
    }

    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.0
            || host
                .strip_suffix(self.0.as_str())
                .is_some_and(|rest| rest.ends_with('.'))
    }
}

/// Ordered domain rules; the first matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    rules: Vec<(DomainPattern, FetchStrategy)>,
    fallback: FetchStrategy,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that renders the given domains and fetches everything else plainly.
    pub fn rendering<I, D>(domains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        domains.into_iter().fold(Self::new(), |registry, domain| {
            registry.with_rule(domain.as_ref(), FetchStrategy::Rendered)
        })
    }

    pub fn with_rule(mut self, pattern: &str, strategy: FetchStrategy) -> Self {
        if !pattern.trim().is_empty() {
            self.rules.push((DomainPattern::new(pattern), strategy));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Strategy for `url`. Unparseable URLs get the fallback and fail in the fetcher.
    pub fn select(&self, url: &str) -> FetchStrategy {
        let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_owned)) else {
            return self.fallback;
        };

        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(&host))
            .map_or(self.fallback, |(_, strategy)| *strategy)
    }
}

/// [`Fetcher`] that routes each URL to a plain or rendering fetcher.
#[derive(Clone)]
pub struct FetchRouter<P, R = P> {
    registry: Arc<StrategyRegistry>,
    plain: P,
    rendered: Option<R>,
}

impl<P: Fetcher> FetchRouter<P, P> {
    /// Router without a rendering backend; rendered domains fall back to `plain`.
    pub fn plain_only(registry: StrategyRegistry, plain: P) -> Self {
        Self {
            registry: Arc::new(registry),
            plain,
            rendered: None,
        }
    }
}

impl<P: Fetcher, R: Fetcher> FetchRouter<P, R> {
    pub fn with_renderer(registry: StrategyRegistry, plain: P, rendered: R) -> Self {
        Self {
            registry: Arc::new(registry),
            plain,
            rendered: Some(rendered),
        }
    }

    pub fn strategy_for(&self, url: &str) -> FetchStrategy {
        self.registry.select(url)
    }
}

impl<P: Fetcher, R: Fetcher> Fetcher for FetchRouter<P, R> {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        match (self.registry.select(url), &self.rendered) {
            (FetchStrategy::Rendered, Some(renderer)) => renderer.fetch(url).await,
            (FetchStrategy::Rendered, None) => {
                tracing::warn!(%url, "No rendering fetcher configured, using plain fetch");
                self.plain.fetch(url).await
            }
            (FetchStrategy::Plain, _) => self.plain.fetch(url).await,
        }
    }
}
