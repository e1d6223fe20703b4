use super::{
    CastCredit, ExternalIds, ImageRef, MetadataProvider, ProviderCredits, ProviderDetails,
    ProviderEpisode, ProviderError, ProviderImages, ProviderSearchHit, ProviderSeason,
    SeasonSummary,
};
use crate::config::ProviderConfig;
use crate::domain::{EntryId, EntryKind};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawSeasonSummary {
    season_number: u32,
    name: Option<String>,
    episode_count: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDetails {
    title: Option<String>,
    name: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    status: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
    runtime: Option<i32>,
    episode_run_time: Vec<i32>,
    number_of_seasons: Option<i32>,
    number_of_episodes: Option<i32>,
    genres: Vec<RawGenre>,
    seasons: Vec<RawSeasonSummary>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    file_path: String,
    iso_639_1: Option<String>,
    #[serde(default)]
    vote_average: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawImages {
    logos: Vec<RawImage>,
    backdrops: Vec<RawImage>,
    posters: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawCast {
    name: String,
    character: Option<String>,
    profile_path: Option<String>,
    #[serde(default)]
    order: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCredits {
    cast: Vec<RawCast>,
}

#[derive(Debug, Deserialize)]
struct RawEpisode {
    episode_number: i32,
    name: Option<String>,
    overview: Option<String>,
    still_path: Option<String>,
    air_date: Option<String>,
    runtime: Option<i32>,
    vote_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawSeason {
    season_number: u32,
    #[serde(default)]
    episodes: Vec<RawEpisode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawExternalIds {
    imdb_id: Option<String>,
    tvdb_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawSearchHit {
    id: u64,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSearchPage {
    #[serde(default)]
    results: Vec<RawSearchHit>,
}

/// Client for the TMDB v3 API.
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    image_base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Curatarr/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build provider HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    /// Language part of the configured locale (`en-US` -> `en`).
    fn iso_language(&self) -> &str {
        self.language.split('-').next().unwrap_or("en")
    }

    fn build_url(&self, path: &str, extra: &[(&str, &str)]) -> Result<url::Url, ProviderError> {
        let mut url = url::Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| ProviderError::Decode(format!("invalid provider URL: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api_key", &self.api_key);
            pairs.append_pair("language", &self.language);
            for (key, value) in extra {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = self.build_url(path, extra)?;
        debug!(path, "Provider request");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn image_url(&self, size: &str, path: Option<String>) -> Option<String> {
        path.filter(|p| !p.is_empty())
            .map(|p| format!("{}/{}{}", self.image_base_url, size, p))
    }

    fn map_details(&self, raw: RawDetails, kind: EntryKind) -> ProviderDetails {
        let (title, release_date, runtime) = match kind {
            EntryKind::Movie => (raw.title.or(raw.name), raw.release_date, raw.runtime),
            EntryKind::Series => (
                raw.name.or(raw.title),
                raw.first_air_date,
                raw.episode_run_time.first().copied(),
            ),
        };

        ProviderDetails {
            title: title.unwrap_or_default(),
            overview: non_empty(raw.overview),
            tagline: non_empty(raw.tagline),
            status: non_empty(raw.status),
            release_date: non_empty(release_date),
            poster_url: self.image_url("w500", raw.poster_path),
            backdrop_url: self.image_url("w1280", raw.backdrop_path),
            vote_average: raw.vote_average,
            vote_count: raw.vote_count,
            runtime,
            number_of_seasons: raw.number_of_seasons,
            number_of_episodes: raw.number_of_episodes,
            genres: raw.genres.into_iter().map(|g| g.name).collect(),
            seasons: raw
                .seasons
                .into_iter()
                .map(|s| SeasonSummary {
                    season_number: s.season_number,
                    name: s.name,
                    episode_count: s.episode_count,
                })
                .collect(),
        }
    }

    fn map_images(&self, raw: RawImages) -> ProviderImages {
        let map = |images: Vec<RawImage>, size: &str| -> Vec<ImageRef> {
            images
                .into_iter()
                .filter_map(|i| {
                    self.image_url(size, Some(i.file_path)).map(|url| ImageRef {
                        url,
                        language: non_empty(i.iso_639_1),
                        vote_average: i.vote_average,
                    })
                })
                .collect()
        };

        ProviderImages {
            logos: map(raw.logos, "original"),
            backdrops: map(raw.backdrops, "w1280"),
            posters: map(raw.posters, "w500"),
        }
    }

    fn map_credits(&self, raw: RawCredits) -> ProviderCredits {
        let mut cast: Vec<CastCredit> = raw
            .cast
            .into_iter()
            .map(|c| CastCredit {
                name: c.name,
                character: non_empty(c.character),
                profile_url: self.image_url("w185", c.profile_path),
                order: c.order,
            })
            .collect();
        cast.sort_by_key(|c| c.order);

        ProviderCredits { cast }
    }

    fn map_season(&self, raw: RawSeason) -> ProviderSeason {
        let mut episodes: Vec<ProviderEpisode> = raw
            .episodes
            .into_iter()
            .map(|e| ProviderEpisode {
                episode_number: e.episode_number,
                name: non_empty(e.name),
                overview: non_empty(e.overview),
                still_url: self.image_url("w300", e.still_path),
                air_date: non_empty(e.air_date),
                runtime: e.runtime,
                vote_average: e.vote_average,
            })
            .collect();
        episodes.sort_by_key(|e| e.episode_number);

        ProviderSeason {
            season_number: raw.season_number,
            episodes,
        }
    }

    fn map_search_hit(&self, raw: RawSearchHit) -> Option<ProviderSearchHit> {
        let kind = match raw.media_type.as_deref() {
            Some("movie") => EntryKind::Movie,
            Some("tv") => EntryKind::Series,
            _ => return None,
        };

        let (title, release_date) = match kind {
            EntryKind::Movie => (raw.title.or(raw.name), raw.release_date),
            EntryKind::Series => (raw.name.or(raw.title), raw.first_air_date),
        };

        Some(ProviderSearchHit {
            id: EntryId::from(raw.id),
            kind,
            title: title.unwrap_or_default(),
            poster_url: self.image_url("w500", raw.poster_path),
            release_date: non_empty(release_date),
            overview: non_empty(raw.overview),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbClient {
    async fn fetch_details(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ProviderDetails, ProviderError> {
        let path = format!("{}/{}", kind.provider_segment(), id);
        let raw: RawDetails = self.get_json(&path, &[]).await?;
        Ok(self.map_details(raw, kind))
    }

    async fn fetch_images(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ProviderImages, ProviderError> {
        let path = format!("{}/{}/images", kind.provider_segment(), id);
        let languages = format!("{},null", self.iso_language());
        let raw: RawImages = self
            .get_json(&path, &[("include_image_language", &languages)])
            .await?;
        Ok(self.map_images(raw))
    }

    async fn fetch_credits(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ProviderCredits, ProviderError> {
        let path = format!("{}/{}/credits", kind.provider_segment(), id);
        let raw: RawCredits = self.get_json(&path, &[]).await?;
        Ok(self.map_credits(raw))
    }

    async fn fetch_season_details(
        &self,
        id: &EntryId,
        season: u32,
    ) -> Result<ProviderSeason, ProviderError> {
        let path = format!("tv/{id}/season/{season}");
        let raw: RawSeason = self.get_json(&path, &[]).await?;
        Ok(self.map_season(raw))
    }

    async fn fetch_external_ids(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ExternalIds, ProviderError> {
        let path = format!("{}/{}/external_ids", kind.provider_segment(), id);
        let raw: RawExternalIds = self.get_json(&path, &[]).await?;
        Ok(ExternalIds {
            imdb_id: non_empty(raw.imdb_id),
            tvdb_id: raw.tvdb_id,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<ProviderSearchHit>, ProviderError> {
        let page: RawSearchPage = self
            .get_json("search/multi", &[("query", query), ("include_adult", "false")])
            .await?;

        Ok(page
            .results
            .into_iter()
            .filter_map(|hit| self.map_search_hit(hit))
            .collect())
    }
}
