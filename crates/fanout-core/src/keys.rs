/// Names of the shared-store collections.
///
/// Coordinators and workers only interoperate if they agree on these names,
/// so every key is derived from a single prefix.
///
/// | Key | Type | Contents |
/// |-----|------|----------|
/// | `{p}:queue` | List | JSON-encoded tasks, FIFO |
/// | `{p}:visited` | Set | every URL ever claimed |
/// | `{p}:visited:{session}` | Set | URLs claimed within a session (per-session dedup) |
/// | `{p}:results` | Hash | legacy global url → result |
/// | `{p}:results:{session}` | Hash | url → result for one session |
/// | `{p}:session:{session}` | Hash | session metadata |
/// | `{p}:sessions` | List | session ids in submission order |
/// | `{p}:workers` | Hash | worker id → `idle` or current URL |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("crawler")
    }
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn queue(&self) -> String {
        format!("{}:queue", self.prefix)
    }

    pub fn visited(&self) -> String {
        format!("{}:visited", self.prefix)
    }

    pub fn session_visited(&self, session_id: &str) -> String {
        format!("{}:visited:{session_id}", self.prefix)
    }

    pub fn legacy_results(&self) -> String {
        format!("{}:results", self.prefix)
    }

    pub fn session_results(&self, session_id: &str) -> String {
        format!("{}:results:{session_id}", self.prefix)
    }

    pub fn session(&self, session_id: &str) -> String {
        format!("{}:session:{session_id}", self.prefix)
    }

    pub fn session_history(&self) -> String {
        format!("{}:sessions", self.prefix)
    }

    pub fn workers(&self) -> String {
        format!("{}:workers", self.prefix)
    }
}
