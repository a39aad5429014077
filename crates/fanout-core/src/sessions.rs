use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::keys::KeySpace;
use crate::models::{Session, SessionStatus};
use crate::store::CoordinationStore;

const FIELD_URLS: &str = "urls";
const FIELD_START_TIME: &str = "start_time";
const FIELD_STATUS: &str = "status";
const FIELD_SUBMITTED: &str = "submitted";

/// Per-session metadata plus the ordered history of session ids.
#[derive(Debug, Clone)]
pub struct SessionStore<S: CoordinationStore> {
    store: S,
    keys: KeySpace,
}

impl<S: CoordinationStore> SessionStore<S> {
    pub fn new(store: S, keys: &KeySpace) -> Self {
        Self {
            store,
            keys: keys.clone(),
        }
    }

    /// Write the metadata record, then append the id to the history list.
    pub async fn create(&self, session: &Session) -> Result<(), AppError> {
        let fields = [
            (FIELD_URLS, serde_json::to_string(&session.urls)?),
            (FIELD_START_TIME, session.start_time.to_rfc3339()),
            (FIELD_STATUS, session.status.to_string()),
            (FIELD_SUBMITTED, session.submitted_count.to_string()),
        ];
        self.store
            .hash_set_many(&self.keys.session(&session.id), &fields)
            .await?;
        self.store
            .list_append(&self.keys.session_history(), &session.id)
            .await?;
        Ok(())
    }

    /// Load a session. Missing or unreadable metadata yields `None`.
    pub async fn get(&self, session_id: &str) -> Result<Option<Session>, AppError> {
        let fields = self
            .store
            .hash_get_all(&self.keys.session(session_id))
            .await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let session = decode_session(session_id, &fields);
        if session.is_none() {
            tracing::warn!(%session_id, "Skipping session with incomplete metadata");
        }
        Ok(session)
    }

    /// Session ids in submission order.
    pub async fn history(&self) -> Result<Vec<String>, AppError> {
        self.store
            .list_range(&self.keys.session_history(), 0, -1)
            .await
    }
}

fn decode_session(id: &str, fields: &HashMap<String, String>) -> Option<Session> {
    let start_time = DateTime::parse_from_rfc3339(fields.get(FIELD_START_TIME)?)
        .ok()?
        .with_timezone(&Utc);
    let submitted_count = fields.get(FIELD_SUBMITTED)?.parse().ok()?;
    let urls = match fields.get(FIELD_URLS) {
        Some(raw) => serde_json::from_str(raw).ok()?,
        None => Vec::new(),
    };
    let status = fields
        .get(FIELD_STATUS)
        .and_then(|s| s.parse().ok())
        .unwrap_or(SessionStatus::Active);

    Some(Session {
        id: id.to_string(),
        urls,
        start_time,
        status,
        submitted_count,
    })
}
