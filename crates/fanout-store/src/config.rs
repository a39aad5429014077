use fanout_core::AppError;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Connection settings for the coordination store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
        }
    }
}

impl StoreConfig {
    /// Read configuration from environment variables.
    ///
    /// - `REDIS_URL` (optional, defaults to `redis://127.0.0.1:6379`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_url(std::env::var("REDIS_URL").ok())
    }

    /// Validate an explicit URL; `None` or blank means the default.
    pub fn from_url(url: Option<String>) -> Result<Self, AppError> {
        let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) else {
            return Ok(Self::default());
        };

        let scheme_ok = ["redis://", "rediss://", "redis+unix://", "unix://"]
            .iter()
            .any(|scheme| url.starts_with(scheme));
        if !scheme_ok {
            return Err(AppError::ConfigError(format!(
                "Invalid REDIS_URL '{url}': expected a redis:// or rediss:// URL"
            )));
        }

        Ok(Self { url })
    }
}
