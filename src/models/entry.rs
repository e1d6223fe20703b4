use crate::domain::{EntryId, EntryKind, OverrideSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A movie or series catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub kind: EntryKind,
    pub content: EntryContent,
    pub metadata: EntryMetadata,
    #[serde(default)]
    pub overrides: OverrideSet,
    pub created_at: String,
    /// Set on every successful metadata write.
    pub media_updated_at: Option<String>,
}

impl Entry {
    /// A blank record for an id that has never been saved.
    #[must_use]
    pub fn new(id: EntryId, kind: EntryKind) -> Self {
        Self {
            id,
            kind,
            content: EntryContent::empty(kind),
            metadata: EntryMetadata::default(),
            overrides: OverrideSet::empty(),
            created_at: chrono::Utc::now().to_rfc3339(),
            media_updated_at: None,
        }
    }

    #[must_use]
    pub const fn admin_edited(&self) -> bool {
        self.overrides.admin_edited()
    }
}

/// Presentation metadata shown for an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryMetadata {
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub logo_url: Option<String>,
    /// Image used for the hover preview card.
    pub hover_image_url: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    /// Movies only.
    pub runtime: Option<i32>,
    /// Series only.
    pub season_count: Option<i32>,
    /// Series only.
    pub episode_count: Option<i32>,
    pub genres: Vec<String>,
    pub cast: Vec<CastMember>,
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
}

/// Watch/download link payload; its shape depends on the entry kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryContent {
    Movie {
        watch_link: Option<String>,
        download_link: Option<String>,
    },
    Series {
        seasons: BTreeMap<u32, SeasonLinks>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonLinks {
    pub watch_links: Vec<String>,
    pub download_links: Vec<String>,
}

impl EntryContent {
    #[must_use]
    pub const fn empty(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Movie => Self::Movie {
                watch_link: None,
                download_link: None,
            },
            EntryKind::Series => Self::Series {
                seasons: BTreeMap::new(),
            },
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Movie { .. } => EntryKind::Movie,
            Self::Series { .. } => EntryKind::Series,
        }
    }

    /// Adds an empty slot for every listed season that has none yet.
    /// Existing slots are never modified. Returns whether anything changed.
    pub fn ensure_season_slots(&mut self, season_numbers: &[u32]) -> bool {
        let Self::Series { seasons } = self else {
            return false;
        };

        let mut changed = false;
        for number in season_numbers {
            if !seasons.contains_key(number) {
                seasons.insert(*number, SeasonLinks::default());
                changed = true;
            }
        }
        changed
    }
}
