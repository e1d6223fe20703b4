use crate::domain::EntryKind;
use crate::models::entry::{Entry, EntryContent};
use crate::models::episode::EpisodeMetadata;
use crate::models::request::ContentRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a trashed record was deleted from. Used for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginCategory {
    Movies,
    Series,
    Requests,
}

impl OriginCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Series => "series",
            Self::Requests => "requests",
        }
    }

    #[must_use]
    pub const fn for_kind(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Movie => Self::Movies,
            EntryKind::Series => Self::Series,
        }
    }
}

impl fmt::Display for OriginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Anything the trash can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashableRecord {
    Entry {
        entry: Entry,
        /// Stored episode rows of a series, restored together with the entry.
        #[serde(default)]
        episodes: Vec<EpisodeMetadata>,
    },
    Request(ContentRequest),
}

impl TrashableRecord {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Entry { entry, .. } => entry.id.as_str(),
            Self::Request(r) => &r.id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Entry { entry, .. } => entry.kind,
            Self::Request(r) => r.kind,
        }
    }
}

/// Point-in-time snapshot of a deleted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashedEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub origin: OriginCategory,
    pub title: String,
    pub poster_url: Option<String>,
    pub content: Option<EntryContent>,
    pub deleted_at: String,
    pub record: TrashableRecord,
}

impl TrashedEntry {
    #[must_use]
    pub fn snapshot(record: TrashableRecord, origin: OriginCategory) -> Self {
        let (title, poster_url, content) = match &record {
            TrashableRecord::Entry { entry, .. } => (
                entry.metadata.title.clone(),
                entry.metadata.poster_url.clone(),
                Some(entry.content.clone()),
            ),
            TrashableRecord::Request(r) => (r.title.clone(), r.poster_url.clone(), None),
        };

        Self {
            id: record.id().to_string(),
            kind: record.kind(),
            origin,
            title,
            poster_url,
            content,
            deleted_at: chrono::Utc::now().to_rfc3339(),
            record,
        }
    }
}
