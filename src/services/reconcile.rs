//! Reconciliation of operator-curated fields with provider data.
//!
//! Every write path goes through here. The rule is the same at both
//! levels: a field group (entry metadata, entry links, one episode) that an
//! operator has taken ownership of is never overwritten by an automatic
//! action. Only an explicit [`ReconcileService::refresh`] followed by a
//! [`ReconcileService::save`] can replace it.

use crate::clients::{
    ExternalIds, MetadataProvider, ProviderCredits, ProviderDetails, ProviderError, ProviderImages,
};
use crate::constants::provider::{LOGO_LANGUAGE, MAX_CAST_MEMBERS};
use crate::db::CatalogStore;
use crate::domain::{CatalogError, EntryId, EntryKind, FieldGroup};
use crate::models::entry::{CastMember, Entry, EntryContent, EntryMetadata};
use crate::models::episode::{EpisodeInput, EpisodeMetadata};
use crate::services::session::{EntryDraft, SessionContext};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which flags an explicit refresh proposes. Upstream values are staged
/// either way; only the later save decides what is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Propose the stored per-group flags unchanged.
    #[default]
    PreserveOverrides,
    /// Propose clearing every flag.
    OverwriteAll,
}

/// Field groups to write in a save. `None` leaves a group as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveRequest {
    pub metadata: Option<EntryMetadata>,
    pub content: Option<EntryContent>,
    /// Flag for the metadata group, and for links unless set below.
    pub admin_edited: bool,
    /// Flag for the links group; `None` follows `admin_edited`.
    pub links_admin_edited: Option<bool>,
}

impl SaveRequest {
    const fn links_flag(&self) -> bool {
        match self.links_admin_edited {
            Some(flag) => flag,
            None => self.admin_edited,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub entry: Entry,
    /// Whether the caller should now run the season backfill.
    pub backfill_due: bool,
}

/// Both interpretations of an ambiguous provider id, plus the chosen one.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResolution {
    pub id: EntryId,
    pub kind: EntryKind,
    pub season_count: Option<i32>,
    pub details: ProviderDetails,
    pub movie: Option<ProviderDetails>,
    pub series: Option<ProviderDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeasonBackfill {
    pub season: u32,
    /// Episode numbers written.
    pub written: Vec<i32>,
    /// Episodes left alone because an operator owns them.
    pub skipped_admin: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoRefreshOutcome {
    pub metadata_written: bool,
    pub slots_added: bool,
    /// Upstream season numbers, ascending (series only).
    pub seasons: Vec<u32>,
}

pub struct ReconcileService {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn MetadataProvider>,
}

impl ReconcileService {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self { store, provider }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.provider
    }

    async fn load_entry(&self, id: &EntryId) -> Result<Option<Entry>, CatalogError> {
        self.store.get_entry(id).await.map_err(CatalogError::read)
    }

    /// Re-reads upstream and stages the result into the session's draft.
    ///
    /// Nothing is written to the store. On failure the existing draft, if
    /// any, is left as it was.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::NotFound`] if the provider has no such record
    /// - [`CatalogError::ProviderUnavailable`] if the details fetch fails
    /// - [`CatalogError::StoreUnavailable`] if the stored entry can't be read
    pub async fn refresh(
        &self,
        session: &SessionContext,
        id: &EntryId,
        kind: EntryKind,
        policy: RefreshPolicy,
    ) -> Result<EntryDraft, CatalogError> {
        let stored = self.load_entry(id).await?;
        let upstream = self.fetch_upstream(id, kind).await?;

        let stored = stored.filter(|e| e.kind == kind);
        let overrides = stored
            .as_ref()
            .map(|e| e.overrides)
            .unwrap_or_default();

        let mut content = match session.draft(id) {
            Some(draft) => draft.content,
            None => stored.map_or_else(|| EntryContent::empty(kind), |e| e.content),
        };
        content.ensure_season_slots(&upstream.seasons);

        let (admin_edited, links_admin_edited) = match policy {
            RefreshPolicy::PreserveOverrides => (
                overrides.contains(FieldGroup::Metadata),
                overrides.contains(FieldGroup::Links),
            ),
            RefreshPolicy::OverwriteAll => (false, false),
        };

        let draft = EntryDraft {
            id: id.clone(),
            kind,
            metadata: upstream.metadata,
            content,
            admin_edited,
            links_admin_edited,
            upstream_seasons: upstream.seasons,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        };

        session.stage(draft.clone());
        debug!(entry_id = %id, ?policy, "Staged refreshed draft");
        Ok(draft)
    }

    /// Writes the supplied groups verbatim and sets each one's flag from
    /// the request. Never consults the provider.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidInput`] if `kind` or the content shape
    ///   contradicts the stored record
    /// - [`CatalogError::StoreUnavailable`] / [`CatalogError::StoreWriteFailed`]
    pub async fn save(
        &self,
        id: &EntryId,
        kind: EntryKind,
        request: SaveRequest,
    ) -> Result<SaveOutcome, CatalogError> {
        if let Some(content) = &request.content
            && content.kind() != kind
        {
            return Err(CatalogError::InvalidInput(format!(
                "{} links supplied for {kind} {id}",
                content.kind()
            )));
        }

        let mut entry = match self.load_entry(id).await? {
            Some(existing) if existing.kind != kind => {
                return Err(CatalogError::InvalidInput(format!(
                    "{id} is stored as a {}, not a {kind}",
                    existing.kind
                )));
            }
            Some(existing) => existing,
            None => Entry::new(id.clone(), kind),
        };

        let links_flag = request.links_flag();

        if let Some(mut metadata) = request.metadata {
            metadata.cast.truncate(MAX_CAST_MEMBERS);
            entry.metadata = metadata;
            entry.overrides.set(FieldGroup::Metadata, request.admin_edited);
            entry.media_updated_at = Some(chrono::Utc::now().to_rfc3339());
        }

        if let Some(content) = request.content {
            entry.content = content;
            entry.overrides.set(FieldGroup::Links, links_flag);
        }

        self.store
            .upsert_entry(&entry)
            .await
            .map_err(CatalogError::write)?;

        info!(
            entry_id = %id,
            kind = %kind,
            admin_edited = entry.admin_edited(),
            "Saved catalog entry"
        );

        Ok(SaveOutcome {
            backfill_due: kind == EntryKind::Series && !request.admin_edited,
            entry,
        })
    }

    /// Looks an id up as both a movie and a series and picks one.
    ///
    /// A series with at least one season wins; otherwise the movie does. If
    /// only one kind resolves it is used.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidIdentifier`] before any network call
    /// - [`CatalogError::NotFound`] if neither kind resolves
    /// - [`CatalogError::ProviderUnavailable`] if neither resolves and a
    ///   lookup failed for another reason than "not found"
    pub async fn resolve_candidate(&self, raw_id: &str) -> Result<CandidateResolution, CatalogError> {
        let id = EntryId::parse(raw_id)?;

        let (movie, series) = tokio::join!(
            self.provider.fetch_details(&id, EntryKind::Movie),
            self.provider.fetch_details(&id, EntryKind::Series),
        );

        let mut failure = None;
        let mut keep = |result: Result<ProviderDetails, ProviderError>, kind: EntryKind| match result {
            Ok(details) => Some(details),
            Err(ProviderError::NotFound(_)) => None,
            Err(e) => {
                warn!(entry_id = %id, kind = %kind, error = %e, "Candidate lookup failed");
                failure = Some(e.to_string());
                None
            }
        };
        let movie = keep(movie, EntryKind::Movie);
        let series = keep(series, EntryKind::Series);

        let series_seasons = series.as_ref().map(season_count);
        let kind = match (&movie, series_seasons) {
            (_, Some(seasons)) if seasons >= 1 => EntryKind::Series,
            (Some(_), _) => EntryKind::Movie,
            (None, Some(_)) => EntryKind::Series,
            (None, None) => {
                return Err(failure.map_or_else(
                    || CatalogError::NotFound(format!("{id} as movie or series")),
                    CatalogError::ProviderUnavailable,
                ));
            }
        };

        let details = match kind {
            EntryKind::Movie => movie.clone(),
            EntryKind::Series => series.clone(),
        }
        .unwrap_or_default();

        debug!(entry_id = %id, kind = %kind, "Resolved candidate");

        Ok(CandidateResolution {
            id,
            kind,
            season_count: (kind == EntryKind::Series).then(|| season_count(&details)),
            details,
            movie,
            series,
        })
    }

    /// One unit of season backfill: fetch the season and write every
    /// episode an operator has not taken ownership of, in a single batch.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ProviderUnavailable`] / [`CatalogError::NotFound`]
    ///   if the season fetch fails
    /// - [`CatalogError::StoreUnavailable`] / [`CatalogError::StoreWriteFailed`]
    pub async fn backfill_season(
        &self,
        id: &EntryId,
        season: u32,
    ) -> Result<SeasonBackfill, CatalogError> {
        let upstream = self.provider.fetch_season_details(id, season).await?;
        let season_key = season_number(season)?;

        let inputs: Vec<EpisodeInput> = upstream
            .episodes
            .into_iter()
            .map(|e| EpisodeInput {
                episode_number: e.episode_number,
                name: e.name,
                overview: e.overview,
                still_url: e.still_url,
                air_date: e.air_date,
                runtime: e.runtime,
                vote_average: e.vote_average,
                admin_edited: false,
            })
            .collect();

        // The store re-checks each row's flag at write time.
        let written = self
            .store
            .upsert_unowned_episodes(id, season_key, &inputs)
            .await
            .map_err(CatalogError::write)?;

        let mut skipped_admin: Vec<i32> = inputs
            .iter()
            .map(|e| e.episode_number)
            .filter(|n| !written.contains(n))
            .collect();
        skipped_admin.sort_unstable();
        debug!(
            entry_id = %id,
            season,
            written = written.len(),
            skipped = skipped_admin.len(),
            "Season backfilled"
        );

        Ok(SeasonBackfill {
            season,
            written,
            skipped_admin,
        })
    }

    /// Saves one episode verbatim with the caller's flag.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] if the entry is not stored, otherwise
    /// store errors.
    pub async fn save_episode(
        &self,
        id: &EntryId,
        season: u32,
        mut fields: EpisodeInput,
        admin_edited: bool,
    ) -> Result<EpisodeMetadata, CatalogError> {
        if self.load_entry(id).await?.is_none() {
            return Err(CatalogError::NotFound(format!("entry {id}")));
        }

        let season_key = season_number(season)?;
        let episode = fields.episode_number;
        fields.admin_edited = admin_edited;

        self.store
            .upsert_episodes(id, season_key, std::slice::from_ref(&fields))
            .await
            .map_err(CatalogError::write)?;

        info!(entry_id = %id, season, episode, admin_edited, "Saved episode");

        self.store
            .list_episodes(id, Some(season_key))
            .await
            .map_err(CatalogError::read)?
            .into_iter()
            .find(|e| e.episode_number == episode)
            .ok_or_else(|| CatalogError::NotFound(format!("episode S{season}E{episode} of {id}")))
    }

    /// Reads one episode upstream for staging. Nothing is written.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] if the season or episode does not exist
    /// upstream, [`CatalogError::ProviderUnavailable`] on fetch failure.
    pub async fn refresh_episode(
        &self,
        id: &EntryId,
        season: u32,
        episode: i32,
    ) -> Result<EpisodeInput, CatalogError> {
        let upstream = self.provider.fetch_season_details(id, season).await?;

        upstream
            .episodes
            .into_iter()
            .find(|e| e.episode_number == episode)
            .map(|e| EpisodeInput {
                episode_number: e.episode_number,
                name: e.name,
                overview: e.overview,
                still_url: e.still_url,
                air_date: e.air_date,
                runtime: e.runtime,
                vote_average: e.vote_average,
                admin_edited: false,
            })
            .ok_or_else(|| CatalogError::NotFound(format!("episode S{season}E{episode} of {id}")))
    }

    /// # Errors
    ///
    /// [`CatalogError::StoreWriteFailed`] if the delete is rejected.
    pub async fn delete_episode(
        &self,
        id: &EntryId,
        season: u32,
        episode: i32,
    ) -> Result<bool, CatalogError> {
        let removed = self
            .store
            .delete_episode(id, season_number(season)?, episode)
            .await
            .map_err(CatalogError::write)?;

        if removed {
            info!(entry_id = %id, season, episode, "Deleted episode");
        }
        Ok(removed)
    }

    /// Deletes every episode row of one season.
    ///
    /// # Errors
    ///
    /// [`CatalogError::StoreWriteFailed`] if the delete is rejected.
    pub async fn delete_season(&self, id: &EntryId, season: u32) -> Result<u64, CatalogError> {
        let removed = self
            .store
            .delete_season(id, season_number(season)?)
            .await
            .map_err(CatalogError::write)?;

        info!(entry_id = %id, season, removed, "Deleted season episodes");
        Ok(removed)
    }

    /// The automatic (non-operator) refresh of one entry.
    ///
    /// Upstream details are always read, since batch sync needs the season
    /// list. Metadata is written only when the metadata group is clear;
    /// empty link slots for new upstream seasons are added only when the
    /// links group is clear. An entry that owns both keeps every field,
    /// including `media_updated_at`.
    ///
    /// # Errors
    ///
    /// Provider and store errors, mapped to [`CatalogError`].
    pub async fn apply_automatic_refresh(
        &self,
        entry: &Entry,
    ) -> Result<AutoRefreshOutcome, CatalogError> {
        let id = &entry.id;
        let metadata_owned = entry.overrides.contains(FieldGroup::Metadata);
        let links_owned = entry.overrides.contains(FieldGroup::Links);

        let (metadata, seasons) = if metadata_owned {
            let details = self.provider.fetch_details(id, entry.kind).await?;
            (None, upstream_seasons(&details, entry.kind))
        } else {
            let upstream = self.fetch_upstream(id, entry.kind).await?;
            (Some(upstream.metadata), upstream.seasons)
        };

        let mut current = self
            .load_entry(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("entry {id}")))?;

        let mut outcome = AutoRefreshOutcome {
            seasons,
            ..AutoRefreshOutcome::default()
        };

        // Flags are re-checked on the fresh row: an operator may have saved
        // while the fetch was in flight.
        if let Some(metadata) = metadata
            && !current.overrides.contains(FieldGroup::Metadata)
        {
            current.metadata = metadata;
            current.media_updated_at = Some(chrono::Utc::now().to_rfc3339());
            outcome.metadata_written = true;
        }

        if !links_owned && !current.overrides.contains(FieldGroup::Links) {
            outcome.slots_added = current.content.ensure_season_slots(&outcome.seasons);
        }

        if outcome.metadata_written || outcome.slots_added {
            self.store
                .upsert_entry(&current)
                .await
                .map_err(CatalogError::write)?;
        }

        debug!(
            entry_id = %id,
            metadata_written = outcome.metadata_written,
            slots_added = outcome.slots_added,
            "Automatic refresh applied"
        );

        Ok(outcome)
    }

    async fn fetch_upstream(&self, id: &EntryId, kind: EntryKind) -> Result<Upstream, CatalogError> {
        let (details, images, credits, external) = tokio::join!(
            self.provider.fetch_details(id, kind),
            self.provider.fetch_images(id, kind),
            self.provider.fetch_credits(id, kind),
            self.provider.fetch_external_ids(id, kind),
        );

        let details = details?;
        let images = images.unwrap_or_else(|e| {
            warn!(entry_id = %id, error = %e, "Image fetch failed, continuing without artwork");
            ProviderImages::default()
        });
        let credits = credits.unwrap_or_else(|e| {
            warn!(entry_id = %id, error = %e, "Credits fetch failed, continuing without cast");
            ProviderCredits::default()
        });
        let external = external.unwrap_or_else(|e| {
            warn!(entry_id = %id, error = %e, "External id lookup failed");
            ExternalIds::default()
        });

        Ok(Upstream {
            seasons: upstream_seasons(&details, kind),
            metadata: upstream_metadata(details, &images, credits, external, kind),
        })
    }
}

struct Upstream {
    metadata: EntryMetadata,
    seasons: Vec<u32>,
}

fn season_number(season: u32) -> Result<i32, CatalogError> {
    i32::try_from(season).map_err(|_| CatalogError::InvalidInput(format!("season {season}")))
}

fn season_count(details: &ProviderDetails) -> i32 {
    details.number_of_seasons.unwrap_or_else(|| {
        let regular = details.seasons.iter().filter(|s| s.season_number > 0).count();
        i32::try_from(regular).unwrap_or(i32::MAX)
    })
}

fn upstream_seasons(details: &ProviderDetails, kind: EntryKind) -> Vec<u32> {
    if kind == EntryKind::Movie {
        return Vec::new();
    }

    let mut seasons: Vec<u32> = details.seasons.iter().map(|s| s.season_number).collect();
    seasons.sort_unstable();
    seasons.dedup();
    seasons
}

fn upstream_metadata(
    details: ProviderDetails,
    images: &ProviderImages,
    credits: ProviderCredits,
    external: ExternalIds,
    kind: EntryKind,
) -> EntryMetadata {
    let backdrop_url = images
        .best_backdrop(LOGO_LANGUAGE)
        .map(|i| i.url.clone())
        .or(details.backdrop_url);

    let mut cast = credits.cast;
    cast.sort_by_key(|c| c.order);

    let is_series = kind == EntryKind::Series;

    EntryMetadata {
        title: details.title,
        poster_url: details.poster_url,
        hover_image_url: backdrop_url.clone(),
        backdrop_url,
        logo_url: images.best_logo(LOGO_LANGUAGE).map(|i| i.url.clone()),
        overview: details.overview,
        tagline: details.tagline,
        status: details.status,
        release_date: details.release_date,
        vote_average: details.vote_average,
        vote_count: details.vote_count,
        runtime: if is_series { None } else { details.runtime },
        season_count: if is_series { details.number_of_seasons } else { None },
        episode_count: if is_series { details.number_of_episodes } else { None },
        genres: details.genres,
        cast: cast
            .into_iter()
            .take(MAX_CAST_MEMBERS)
            .map(|c| CastMember {
                name: c.name,
                character: c.character,
                profile_url: c.profile_url,
            })
            .collect(),
        imdb_id: external.imdb_id,
    }
}
