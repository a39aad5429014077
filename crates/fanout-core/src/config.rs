use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use uuid::Uuid;

use crate::error::AppError;
use crate::keys::KeySpace;

/// Scope within which a URL is processed at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupScope {
    /// A URL claimed in any session is never processed again.
    #[default]
    Global,
    /// Each session may process a URL once, independently of other sessions.
    PerSession,
}

impl DedupScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupScope::Global => "global",
            DedupScope::PerSession => "per-session",
        }
    }
}

impl fmt::Display for DedupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DedupScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "global" => Ok(DedupScope::Global),
            "per-session" | "session" => Ok(DedupScope::PerSession),
            _ => Err(format!("Unknown dedup scope: {}", s)),
        }
    }
}

/// Settings every process touching the store must agree on.
#[derive(Debug, Clone, Default)]
pub struct CoordinationConfig {
    pub keys: KeySpace,
    pub dedup_scope: DedupScope,
}

impl CoordinationConfig {
    /// Read configuration from environment variables.
    ///
    /// - `FANOUT_KEY_PREFIX` (optional, defaults to `crawler`)
    /// - `FANOUT_DEDUP_SCOPE` (optional, `global` or `per-session`, defaults to `global`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let keys = match lookup("FANOUT_KEY_PREFIX") {
            None => KeySpace::default(),
            Some(prefix) if prefix.trim().is_empty() => {
                return Err(AppError::ConfigError(
                    "FANOUT_KEY_PREFIX must not be empty".into(),
                ));
            }
            Some(prefix) => KeySpace::new(prefix.trim()),
        };

        let dedup_scope = match lookup("FANOUT_DEDUP_SCOPE") {
            None => DedupScope::default(),
            Some(raw) => raw.parse().map_err(|e: String| {
                AppError::ConfigError(format!("Invalid FANOUT_DEDUP_SCOPE: {e}"))
            })?,
        };

        Ok(Self { keys, dedup_scope })
    }

    pub fn with_dedup_scope(mut self, scope: DedupScope) -> Self {
        self.dedup_scope = scope;
        self
    }
}

/// Configuration for a worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Identity published in the worker registry. Stable for the process lifetime.
    pub worker_id: String,
    /// How long a single queue pop may block.
    pub pop_timeout: Duration,
    /// Extra sleep after a pop times out on an empty queue.
    pub idle_backoff: Duration,
    /// Also write every result into the legacy global collection.
    pub mirror_legacy_results: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: generate_worker_id(),
            pop_timeout: Duration::from_secs(10),
            idle_backoff: Duration::from_secs(5),
            mirror_legacy_results: true,
        }
    }
}

impl WorkerConfig {
    pub fn with_worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = id.into();
        self
    }

    pub fn with_pop_timeout(mut self, timeout: Duration) -> Self {
        self.pop_timeout = timeout;
        self
    }

    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    pub fn with_mirror_legacy_results(mut self, mirror: bool) -> Self {
        self.mirror_legacy_results = mirror;
        self
    }

    /// Sleep after a failed iteration: twice the idle backoff, saturating.
    pub fn error_backoff(&self) -> Duration {
        self.idle_backoff.saturating_mul(2)
    }
}

/// `worker-` followed by 8 hex characters.
pub fn generate_worker_id() -> String {
    format!("worker-{}", &Uuid::new_v4().simple().to_string()[..8])
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_dedup_scope_parse() {
        assert_eq!("global".parse::<DedupScope>(), Ok(DedupScope::Global));
        assert_eq!(
            "per-session".parse::<DedupScope>(),
            Ok(DedupScope::PerSession)
        );
        assert_eq!(
            "PER_SESSION".parse::<DedupScope>(),
            Ok(DedupScope::PerSession)
        );
        assert!("nope".parse::<DedupScope>().is_err());
    }

    #[test]
    fn test_defaults_without_env() {
        let config = CoordinationConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.keys.prefix(), "crawler");
        assert_eq!(config.dedup_scope, DedupScope::Global);
    }

    #[test]
    fn test_env_overrides() {
        let config = CoordinationConfig::from_lookup(lookup(&[
            ("FANOUT_KEY_PREFIX", "staging"),
            ("FANOUT_DEDUP_SCOPE", "per-session"),
        ]))
        .unwrap();
        assert_eq!(config.keys.queue(), "staging:queue");
        assert_eq!(config.dedup_scope, DedupScope::PerSession);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            CoordinationConfig::from_lookup(lookup(&[("FANOUT_DEDUP_SCOPE", "weekly")])),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            CoordinationConfig::from_lookup(lookup(&[("FANOUT_KEY_PREFIX", " ")])),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_error_backoff_saturates() {
        let config = WorkerConfig::default().with_idle_backoff(Duration::from_secs(5));
        assert_eq!(config.error_backoff(), Duration::from_secs(10));

        let config = WorkerConfig::default().with_idle_backoff(Duration::MAX);
        assert_eq!(config.error_backoff(), Duration::MAX);
    }

    #[test]
    fn test_generated_worker_id() {
        let id = generate_worker_id();
        assert!(id.starts_with("worker-"));
        assert_eq!(id.len(), "worker-".len() + 8);
    }
}
