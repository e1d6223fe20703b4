//! Shared fixtures: an in-memory store with fault switches and a scripted
//! provider that counts its calls.

#![allow(dead_code)]

use anyhow::{Result, bail};
use curatarr::clients::{
    ExternalIds, MetadataProvider, ProviderCredits, ProviderDetails, ProviderEpisode,
    ProviderError, ProviderImages, ProviderSearchHit, ProviderSeason, SeasonSummary,
};
use curatarr::config::Config;
use curatarr::db::CatalogStore;
use curatarr::domain::events::CatalogEvent;
use curatarr::domain::{EntryId, EntryKind};
use curatarr::models::entry::Entry;
use curatarr::models::episode::{EpisodeInput, EpisodeMetadata};
use curatarr::models::request::ContentRequest;
use curatarr::services::CatalogService;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Default)]
struct StoreState {
    entries: Vec<Entry>,
    episodes: BTreeMap<(String, i32, i32), EpisodeMetadata>,
    requests: Vec<ContentRequest>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    pub fail_deletes: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("database is locked");
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("disk I/O error");
        }
        Ok(())
    }

    pub fn entry(&self, id: u64) -> Option<Entry> {
        let id = EntryId::from(id);
        self.state().entries.iter().find(|e| e.id == id).cloned()
    }

    pub fn episodes(&self, id: u64) -> Vec<EpisodeMetadata> {
        let id = EntryId::from(id).to_string();
        self.state()
            .episodes
            .values()
            .filter(|e| e.entry_id.as_str() == id)
            .cloned()
            .collect()
    }

    pub fn episode(&self, id: u64, season: i32, episode: i32) -> Option<EpisodeMetadata> {
        let key = (EntryId::from(id).to_string(), season, episode);
        self.state().episodes.get(&key).cloned()
    }

    pub fn insert(&self, entry: Entry) {
        let mut state = self.state();
        state.entries.retain(|e| e.id != entry.id);
        state.entries.push(entry);
    }

    fn row(entry_id: &EntryId, season: i32, input: &EpisodeInput) -> EpisodeMetadata {
        EpisodeMetadata {
            entry_id: entry_id.clone(),
            season_number: season,
            episode_number: input.episode_number,
            name: input.name.clone(),
            overview: input.overview.clone(),
            still_url: input.still_url.clone(),
            air_date: input.air_date.clone(),
            runtime: input.runtime,
            vote_average: input.vote_average,
            admin_edited: input.admin_edited,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>> {
        self.check_read()?;
        Ok(self.state().entries.iter().find(|e| &e.id == id).cloned())
    }

    async fn list_entries(&self) -> Result<Vec<Entry>> {
        self.check_read()?;
        Ok(self.state().entries.clone())
    }

    async fn search_entries(&self, query: &str, limit: u64) -> Result<Vec<Entry>> {
        self.check_read()?;
        let needle = query.to_lowercase();
        Ok(self
            .state()
            .entries
            .iter()
            .filter(|e| e.metadata.title.to_lowercase().contains(&needle))
            .take(usize::try_from(limit).unwrap())
            .cloned()
            .collect())
    }

    async fn upsert_entry(&self, entry: &Entry) -> Result<()> {
        self.check_write()?;
        let mut state = self.state();
        if let Some(existing) = state.entries.iter_mut().find(|e| e.id == entry.id) {
            *existing = entry.clone();
        } else {
            state.entries.push(entry.clone());
        }
        Ok(())
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            bail!("delete rejected");
        }
        let mut state = self.state();
        let before = state.entries.len();
        state.entries.retain(|e| &e.id != id);
        state.episodes.retain(|(entry, _, _), _| entry != id.as_str());
        Ok(state.entries.len() != before)
    }

    async fn restore_entry(&self, entry: &Entry, episodes: &[EpisodeMetadata]) -> Result<()> {
        self.check_write()?;
        let mut state = self.state();
        state.entries.retain(|e| e.id != entry.id);
        state.entries.push(entry.clone());
        state.episodes.retain(|(id, _, _), _| id != entry.id.as_str());
        for episode in episodes {
            state.episodes.insert(
                (
                    episode.entry_id.to_string(),
                    episode.season_number,
                    episode.episode_number,
                ),
                episode.clone(),
            );
        }
        Ok(())
    }

    async fn list_episodes(
        &self,
        entry_id: &EntryId,
        season: Option<i32>,
    ) -> Result<Vec<EpisodeMetadata>> {
        self.check_read()?;
        Ok(self
            .state()
            .episodes
            .values()
            .filter(|e| &e.entry_id == entry_id && season.is_none_or(|s| s == e.season_number))
            .cloned()
            .collect())
    }

    async fn upsert_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        self.check_write()?;
        let mut state = self.state();
        for input in episodes {
            state.episodes.insert(
                (entry_id.to_string(), season, input.episode_number),
                Self::row(entry_id, season, input),
            );
        }
        Ok(episodes.iter().map(|e| e.episode_number).collect())
    }

    async fn upsert_unowned_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        self.check_write()?;
        let mut state = self.state();
        let mut written = Vec::new();
        for input in episodes {
            let key = (entry_id.to_string(), season, input.episode_number);
            if state.episodes.get(&key).is_some_and(|e| e.admin_edited) {
                continue;
            }
            let mut row = Self::row(entry_id, season, input);
            row.admin_edited = false;
            state.episodes.insert(key, row);
            written.push(input.episode_number);
        }
        Ok(written)
    }

    async fn delete_episode(&self, entry_id: &EntryId, season: i32, episode: i32) -> Result<bool> {
        self.check_write()?;
        Ok(self
            .state()
            .episodes
            .remove(&(entry_id.to_string(), season, episode))
            .is_some())
    }

    async fn delete_season(&self, entry_id: &EntryId, season: i32) -> Result<u64> {
        self.check_write()?;
        let mut state = self.state();
        let before = state.episodes.len();
        state
            .episodes
            .retain(|(id, s, _), _| !(id == entry_id.as_str() && *s == season));
        Ok((before - state.episodes.len()) as u64)
    }

    async fn get_request(&self, id: &str) -> Result<Option<ContentRequest>> {
        self.check_read()?;
        Ok(self.state().requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests(&self) -> Result<Vec<ContentRequest>> {
        self.check_read()?;
        Ok(self.state().requests.clone())
    }

    async fn upsert_request(&self, request: &ContentRequest) -> Result<()> {
        self.check_write()?;
        let mut state = self.state();
        state.requests.retain(|r| r.id != request.id);
        state.requests.push(request.clone());
        Ok(())
    }

    async fn delete_request(&self, id: &str) -> Result<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            bail!("delete rejected");
        }
        let mut state = self.state();
        let before = state.requests.len();
        state.requests.retain(|r| r.id != id);
        Ok(state.requests.len() != before)
    }
}

/// Wraps a store so that an operator episode save commits right before
/// the next automatic episode write reaches the inner store.
pub struct EditDuringBackfill {
    pub inner: Arc<dyn CatalogStore>,
    pending: Mutex<Option<(EntryId, i32, EpisodeInput)>>,
}

impl EditDuringBackfill {
    pub fn new(inner: Arc<dyn CatalogStore>, id: u64, season: i32, edit: EpisodeInput) -> Arc<Self> {
        Arc::new(Self {
            inner,
            pending: Mutex::new(Some((EntryId::from(id), season, edit))),
        })
    }
}

#[async_trait::async_trait]
impl CatalogStore for EditDuringBackfill {
    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>> {
        self.inner.get_entry(id).await
    }

    async fn list_entries(&self) -> Result<Vec<Entry>> {
        self.inner.list_entries().await
    }

    async fn search_entries(&self, query: &str, limit: u64) -> Result<Vec<Entry>> {
        self.inner.search_entries(query, limit).await
    }

    async fn upsert_entry(&self, entry: &Entry) -> Result<()> {
        self.inner.upsert_entry(entry).await
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<bool> {
        self.inner.delete_entry(id).await
    }

    async fn restore_entry(&self, entry: &Entry, episodes: &[EpisodeMetadata]) -> Result<()> {
        self.inner.restore_entry(entry, episodes).await
    }

    async fn list_episodes(
        &self,
        entry_id: &EntryId,
        season: Option<i32>,
    ) -> Result<Vec<EpisodeMetadata>> {
        self.inner.list_episodes(entry_id, season).await
    }

    async fn upsert_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        self.inner.upsert_episodes(entry_id, season, episodes).await
    }

    async fn upsert_unowned_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        let pending = self.pending.lock().unwrap().take();
        if let Some((id, edit_season, mut edit)) = pending {
            edit.admin_edited = true;
            self.inner
                .upsert_episodes(&id, edit_season, std::slice::from_ref(&edit))
                .await?;
        }
        self.inner
            .upsert_unowned_episodes(entry_id, season, episodes)
            .await
    }

    async fn delete_episode(&self, entry_id: &EntryId, season: i32, episode: i32) -> Result<bool> {
        self.inner.delete_episode(entry_id, season, episode).await
    }

    async fn delete_season(&self, entry_id: &EntryId, season: i32) -> Result<u64> {
        self.inner.delete_season(entry_id, season).await
    }

    async fn get_request(&self, id: &str) -> Result<Option<ContentRequest>> {
        self.inner.get_request(id).await
    }

    async fn list_requests(&self) -> Result<Vec<ContentRequest>> {
        self.inner.list_requests().await
    }

    async fn upsert_request(&self, request: &ContentRequest) -> Result<()> {
        self.inner.upsert_request(request).await
    }

    async fn delete_request(&self, id: &str) -> Result<bool> {
        self.inner.delete_request(id).await
    }
}

#[derive(Default)]
struct Script {
    movies: HashMap<u64, ProviderDetails>,
    series: HashMap<u64, ProviderDetails>,
    seasons: HashMap<(u64, u32), ProviderSeason>,
    failing_seasons: HashSet<(u64, u32)>,
    failing_details: HashSet<u64>,
    search_hits: Vec<ProviderSearchHit>,
}

/// Provider double: answers from a script, counts calls, fails on demand.
#[derive(Default)]
pub struct FakeProvider {
    script: Mutex<Script>,
    pub details_calls: AtomicUsize,
    pub season_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub offline: AtomicBool,
}

fn unavailable() -> ProviderError {
    ProviderError::Status {
        status: 503,
        body: "Service Unavailable".to_string(),
    }
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn add_movie(&self, id: u64, title: &str) {
        self.script().movies.insert(
            id,
            ProviderDetails {
                title: title.to_string(),
                overview: Some(format!("{title} overview")),
                runtime: Some(120),
                ..ProviderDetails::default()
            },
        );
    }

    /// A series whose seasons each have `episodes` episodes.
    pub fn add_series(&self, id: u64, title: &str, seasons: &[u32], episodes: i32) {
        let mut script = self.script();
        script.series.insert(
            id,
            ProviderDetails {
                title: title.to_string(),
                overview: Some(format!("{title} overview")),
                seasons: seasons
                    .iter()
                    .map(|n| SeasonSummary {
                        season_number: *n,
                        name: Some(format!("Season {n}")),
                        episode_count: Some(episodes),
                    })
                    .collect(),
                ..ProviderDetails::default()
            },
        );
        for season in seasons {
            script.seasons.insert(
                (id, *season),
                ProviderSeason {
                    season_number: *season,
                    episodes: (1..=episodes)
                        .map(|n| ProviderEpisode {
                            episode_number: n,
                            name: Some(format!("Upstream S{season}E{n}")),
                            ..ProviderEpisode::default()
                        })
                        .collect(),
                },
            );
        }
    }

    pub fn retitle(&self, id: u64, title: &str) {
        let mut guard = self.script();
        let script = &mut *guard;
        for details in [script.movies.get_mut(&id), script.series.get_mut(&id)]
            .into_iter()
            .flatten()
        {
            details.title = title.to_string();
        }
    }

    pub fn fail_season(&self, id: u64, season: u32) {
        self.script().failing_seasons.insert((id, season));
    }

    pub fn fail_details(&self, id: u64) {
        self.script().failing_details.insert(id);
    }

    pub fn add_search_hit(&self, id: u64, kind: EntryKind, title: &str) {
        self.script().search_hits.push(ProviderSearchHit {
            id: EntryId::from(id),
            kind,
            title: title.to_string(),
            poster_url: None,
            release_date: None,
            overview: None,
        });
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for FakeProvider {
    async fn fetch_details(
        &self,
        id: &EntryId,
        kind: EntryKind,
    ) -> Result<ProviderDetails, ProviderError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_offline() {
            return Err(unavailable());
        }
        let script = self.script();
        if script.failing_details.contains(&id.numeric()) {
            return Err(unavailable());
        }
        let table = match kind {
            EntryKind::Movie => &script.movies,
            EntryKind::Series => &script.series,
        };
        table
            .get(&id.numeric())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("{kind} {id}")))
    }

    async fn fetch_images(
        &self,
        _id: &EntryId,
        _kind: EntryKind,
    ) -> Result<ProviderImages, ProviderError> {
        if self.is_offline() {
            return Err(unavailable());
        }
        Ok(ProviderImages::default())
    }

    async fn fetch_credits(
        &self,
        _id: &EntryId,
        _kind: EntryKind,
    ) -> Result<ProviderCredits, ProviderError> {
        if self.is_offline() {
            return Err(unavailable());
        }
        Ok(ProviderCredits::default())
    }

    async fn fetch_season_details(
        &self,
        id: &EntryId,
        season: u32,
    ) -> Result<ProviderSeason, ProviderError> {
        self.season_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_offline() {
            return Err(unavailable());
        }
        let script = self.script();
        if script.failing_seasons.contains(&(id.numeric(), season)) {
            return Err(unavailable());
        }
        script
            .seasons
            .get(&(id.numeric(), season))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("season {season} of {id}")))
    }

    async fn fetch_external_ids(
        &self,
        _id: &EntryId,
        _kind: EntryKind,
    ) -> Result<ExternalIds, ProviderError> {
        if self.is_offline() {
            return Err(unavailable());
        }
        Ok(ExternalIds::default())
    }

    async fn search(&self, query: &str) -> Result<Vec<ProviderSearchHit>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_offline() {
            return Err(unavailable());
        }
        let needle = query.to_lowercase();
        Ok(self
            .script()
            .search_hits
            .iter()
            .filter(|h| h.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

/// Config with pacing off and the trash under `trash_dir`.
pub fn test_config(trash_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.trash.path = trash_dir.display().to_string();
    config.sync.pacing_ms = 0;
    config.sync.burst = 1;
    config
}

pub struct Harness {
    pub catalog: CatalogService,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeProvider>,
    pub events: broadcast::Receiver<CatalogEvent>,
    _trash_dir: tempfile::TempDir,
}

pub fn harness() -> Harness {
    harness_with(|_| {})
}

pub fn harness_with(tweak: impl FnOnce(&mut Config)) -> Harness {
    let trash_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(trash_dir.path());
    tweak(&mut config);

    let store = MemoryStore::new();
    let provider = FakeProvider::new();
    let (event_bus, events) = broadcast::channel(256);

    let catalog = curatarr::state::build_catalog(&config, store.clone(), provider.clone(), event_bus);

    Harness {
        catalog,
        store,
        provider,
        events,
        _trash_dir: trash_dir,
    }
}

pub fn drain(events: &mut broadcast::Receiver<CatalogEvent>) -> Vec<CatalogEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
