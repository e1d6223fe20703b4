use crate::domain::{EntryId, EntryKind};
use serde::{Deserialize, Serialize};

/// A request for a title that is not in the catalog yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub id: String,
    pub kind: EntryKind,
    pub provider_id: Option<EntryId>,
    pub title: String,
    pub poster_url: Option<String>,
    pub note: Option<String>,
    pub requested_at: String,
}

impl ContentRequest {
    #[must_use]
    pub fn new(kind: EntryKind, title: impl Into<String>) -> Self {
        Self {
            id: format!("req-{}", uuid::Uuid::new_v4()),
            kind,
            provider_id: None,
            title: title.into(),
            poster_url: None,
            note: None,
            requested_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
