use crate::domain::EntryId;
use serde::{Deserialize, Serialize};

/// Stored metadata for one episode of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub entry_id: EntryId,
    pub season_number: i32,
    pub episode_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub admin_edited: bool,
    pub updated_at: String,
}

/// Episode values to be written; the row key is supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeInput {
    pub episode_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub admin_edited: bool,
}

impl From<&EpisodeMetadata> for EpisodeInput {
    fn from(m: &EpisodeMetadata) -> Self {
        Self {
            episode_number: m.episode_number,
            name: m.name.clone(),
            overview: m.overview.clone(),
            still_url: m.still_url.clone(),
            air_date: m.air_date.clone(),
            runtime: m.runtime,
            vote_average: m.vote_average,
            admin_edited: m.admin_edited,
        }
    }
}
