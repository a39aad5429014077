use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Sentinel for a field the extractor could not find on the page.
pub const NOT_AVAILABLE: &str = "N/A";

/// Lifecycle status of a submission session.
///
/// Sessions are created `active` and are not transitioned afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

/// One logical batch of submitted URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub urls: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub status: SessionStatus,
    pub submitted_count: usize,
}

impl Session {
    /// Create a fresh `active` session with a newly generated id.
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            submitted_count: urls.len(),
            urls,
            start_time: Utc::now(),
            status: SessionStatus::Active,
        }
    }
}

/// A queued unit of work: fetch `url` on behalf of `session_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub session_id: String,
    pub url: String,
}

impl Task {
    pub fn new(session_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            url: url.into(),
        }
    }

    /// Strictly parse a queue payload.
    ///
    /// Anything that is not an object with string `session_id` and `url`
    /// fields is a [`AppError::MalformedTask`]; values are never coerced.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let task: Task =
            serde_json::from_str(raw).map_err(|e| AppError::MalformedTask(e.to_string()))?;

        if task.session_id.trim().is_empty() {
            return Err(AppError::MalformedTask("empty session_id".into()));
        }
        if task.url.trim().is_empty() {
            return Err(AppError::MalformedTask("empty url".into()));
        }

        Ok(task)
    }

    pub fn encode(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Structured product fields extracted from a page.
///
/// Every field independently falls back to [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub price: String,
    pub rating: String,
    pub availability: String,
    pub image_url: String,
    pub description: String,
}

impl ProductRecord {
    /// A record where nothing was found.
    pub fn not_available() -> Self {
        Self {
            name: NOT_AVAILABLE.to_string(),
            price: NOT_AVAILABLE.to_string(),
            rating: NOT_AVAILABLE.to_string(),
            availability: NOT_AVAILABLE.to_string(),
            image_url: NOT_AVAILABLE.to_string(),
            description: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Stored outcome of processing one URL within one session.
///
/// Encoded once as JSON: `Success` is the bare six-field object, `Failure`
/// is `{"error": reason}`. The `error` key is the failure marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageResult {
    Failure { error: String },
    Success(ProductRecord),
}

impl PageResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        PageResult::Failure {
            error: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PageResult::Failure { .. })
    }

    pub fn encode(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored payload.
    ///
    /// A payload that itself decodes to a JSON string was double-encoded by an
    /// older producer and is decoded exactly once more.
    pub fn decode(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_value(decode_payload(raw)?)?)
    }

    /// Whether a stored payload decodes to an object carrying the `error`
    /// marker, whatever the marker's value.
    pub fn has_failure_marker(raw: &str) -> bool {
        decode_payload(raw).is_ok_and(|value| value.get("error").is_some())
    }

    /// Decode a stored payload, degrading to a synthetic failure carrying the
    /// raw value when it cannot be decoded.
    pub fn decode_lossy(raw: &str) -> Self {
        Self::decode(raw).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Undecodable stored result");
            PageResult::failure(raw)
        })
    }
}

/// Parse a stored payload into JSON, unwrapping one level of string encoding.
fn decode_payload(raw: &str) -> Result<serde_json::Value, AppError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)?,
        other => other,
    })
}

/// What a worker is currently doing, as published in the worker registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Processing(String),
}

impl WorkerStatus {
    pub fn as_str(&self) -> &str {
        match self {
            WorkerStatus::Idle => "idle",
            WorkerStatus::Processing(url) => url,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for WorkerStatus {
    fn from(s: &str) -> Self {
        match s {
            "idle" => WorkerStatus::Idle,
            url => WorkerStatus::Processing(url.to_string()),
        }
    }
}
