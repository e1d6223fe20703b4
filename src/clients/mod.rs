//! Read-only access to the external metadata provider.
//!
//! Every call is a single-shot read: there is no retry here. Missing
//! optional sub-fields come back as `None`/empty instead of errors; only
//! transport failures and non-success statuses raise.

pub mod tmdb;

use crate::domain::{EntryId, EntryKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use tmdb::TmdbClient;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0} not found upstream")]
    NotFound(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

/// Entry-level details, normalized across movies and series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderDetails {
    pub title: String,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub release_date: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub runtime: Option<i32>,
    pub number_of_seasons: Option<i32>,
    pub number_of_episodes: Option<i32>,
    pub genres: Vec<String>,
    pub seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: Option<String>,
    pub episode_count: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderImages {
    pub logos: Vec<ImageRef>,
    pub backdrops: Vec<ImageRef>,
    pub posters: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    /// ISO 639-1 code; `None` for language-neutral artwork.
    pub language: Option<String>,
    pub vote_average: f64,
}

impl ProviderImages {
    /// Best-rated logo in `language`, falling back to a language-neutral one.
    #[must_use]
    pub fn best_logo(&self, language: &str) -> Option<&ImageRef> {
        Self::best_in(&self.logos, language)
    }

    #[must_use]
    pub fn best_backdrop(&self, language: &str) -> Option<&ImageRef> {
        Self::best_in(&self.backdrops, language)
    }

    fn best_in<'a>(images: &'a [ImageRef], language: &str) -> Option<&'a ImageRef> {
        Self::best_matching(images, Some(language)).or_else(|| Self::best_matching(images, None))
    }

    fn best_matching<'a>(images: &'a [ImageRef], language: Option<&str>) -> Option<&'a ImageRef> {
        images
            .iter()
            .filter(|i| i.language.as_deref() == language)
            .max_by(|a, b| a.vote_average.total_cmp(&b.vote_average))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderCredits {
    pub cast: Vec<CastCredit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastCredit {
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
    pub order: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSeason {
    pub season_number: u32,
    pub episodes: Vec<ProviderEpisode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderEpisode {
    pub episode_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<i64>,
}

/// One hit of a free-text provider search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSearchHit {
    pub id: EntryId,
    pub kind: EntryKind,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
}

/// Read-only typed access to the metadata provider.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_details(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ProviderDetails, ProviderError>;

    async fn fetch_images(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ProviderImages, ProviderError>;

    async fn fetch_credits(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ProviderCredits, ProviderError>;

    async fn fetch_season_details(
        &self,
        id: &EntryId,
        season: u32,
    ) -> Result<ProviderSeason, ProviderError>;

    async fn fetch_external_ids(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ExternalIds, ProviderError>;

    async fn search(&self, query: &str) -> Result<Vec<ProviderSearchHit>, ProviderError>;
}
