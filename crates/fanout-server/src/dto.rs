use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fanout_core::PageResult;
use fanout_core::coordinator::{Progress, SessionSummary, SubmitOutcome};

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Documented shape of a submission. The handler accepts any body and
/// reads it leniently.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitUrlsRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmitUrlsResponse {
    pub status: &'static str,
    pub urls_added: usize,
    pub already_crawled: Vec<String>,
    pub session_id: String,
}

impl From<SubmitOutcome> for SubmitUrlsResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            status: "ok",
            urls_added: outcome.urls_added,
            already_crawled: outcome.already_crawled,
            session_id: outcome.session_id,
        }
    }
}

/// Extract the URL list from a submission body.
///
/// An unparseable body, a missing `urls` key, or a non-array `urls` all
/// mean an empty list. Entries that are not non-blank strings are skipped.
pub fn parse_submission(body: &[u8]) -> Vec<String> {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return Vec::new();
    };

    value
        .get("urls")
        .and_then(serde_json::Value::as_array)
        .map(|urls| {
            urls.iter()
                .filter_map(serde_json::Value::as_str)
                .filter(|url| !url.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Results & progress
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ResultsResponse {
    /// URL to either the six product fields or `{"error": reason}`.
    #[schema(value_type = Object)]
    pub results: BTreeMap<String, PageResult>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WorkersResponse {
    /// Worker id to `idle` or the URL being processed.
    pub workers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    pub queued: u64,
    pub visited: u64,
    pub results: u64,
    pub failed: u64,
}

impl From<Progress> for ProgressResponse {
    fn from(p: Progress) -> Self {
        Self {
            queued: p.queued,
            visited: p.visited,
            results: p.results,
            failed: p.failed,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
    pub submitted: usize,
    pub completed: u64,
    pub failed: u64,
    pub start_time: DateTime<Utc>,
}

impl From<SessionSummary> for SessionResponse {
    fn from(s: SessionSummary) -> Self {
        Self {
            session_id: s.session_id,
            submitted: s.submitted,
            completed: s.completed,
            failed: s.failed,
            start_time: s.start_time,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
