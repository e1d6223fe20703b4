//! Programmatic entry point for the presentation layer.
//!
//! Wires the engine, the batch orchestrator, the trash and the search view
//! together and mirrors their progress onto the event bus.

use crate::domain::events::CatalogEvent;
use crate::domain::{CatalogError, EntryId, EntryKind};
use crate::library::trash_cache::CleanupStats;
use crate::models::entry::Entry;
use crate::models::episode::{EpisodeInput, EpisodeMetadata};
use crate::models::trash::TrashedEntry;
use crate::services::reconcile::{
    CandidateResolution, RefreshPolicy, ReconcileService, SaveRequest,
};
use crate::services::search::{CandidateFilter, SearchResults, SearchService};
use crate::services::session::{EntryDraft, SessionContext};
use crate::services::sync::{SyncOrchestrator, SyncProgress, SyncReport};
use crate::services::trash::{RestoreOutcome, TrashService};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Result of [`CatalogService::save_entry`].
#[derive(Debug, Clone)]
pub struct SavedEntry {
    pub entry: Entry,
    /// Season backfill that followed the save, if one was due.
    pub backfill: Option<SyncReport>,
    /// Set when a due backfill could not start at all.
    pub backfill_error: Option<String>,
}

pub struct CatalogService {
    engine: Arc<ReconcileService>,
    sync: Arc<SyncOrchestrator>,
    trash: Arc<TrashService>,
    search: Arc<SearchService>,
    draft_ttl: Duration,
    event_bus: broadcast::Sender<CatalogEvent>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        engine: Arc<ReconcileService>,
        sync: Arc<SyncOrchestrator>,
        trash: Arc<TrashService>,
        search: Arc<SearchService>,
        draft_ttl: Duration,
        event_bus: broadcast::Sender<CatalogEvent>,
    ) -> Self {
        Self {
            engine,
            sync,
            trash,
            search,
            draft_ttl,
            event_bus,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.event_bus.subscribe()
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<ReconcileService> {
        &self.engine
    }

    #[must_use]
    pub fn trash(&self) -> &Arc<TrashService> {
        &self.trash
    }

    /// A fresh operator session using the configured draft TTL.
    #[must_use]
    pub fn new_session(&self) -> SessionContext {
        SessionContext::new(self.draft_ttl)
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine.
        let _ = self.event_bus.send(event);
    }

    fn progress_sink(&self, scope: String) -> impl FnMut(SyncProgress) + Send + use<> {
        let bus = self.event_bus.clone();
        move |p: SyncProgress| {
            let _ = bus.send(CatalogEvent::SyncProgress {
                scope: scope.clone(),
                current: p.current,
                total: p.total,
                message: p.message,
            });
        }
    }

    fn finish(&self, scope: &str, result: &Result<SyncReport, CatalogError>) {
        match result {
            Ok(report) => self.emit(CatalogEvent::SyncFinished {
                scope: scope.to_string(),
                succeeded: report.succeeded,
                failed: report.failed,
                cancelled: report.cancelled,
            }),
            Err(e) => self.emit(CatalogEvent::Error {
                message: format!("{scope}: {e}"),
            }),
        }
    }

    /// # Errors
    ///
    /// See [`ReconcileService::resolve_candidate`].
    pub async fn resolve_candidate(&self, raw_id: &str) -> Result<CandidateResolution, CatalogError> {
        self.engine.resolve_candidate(raw_id).await
    }

    /// # Errors
    ///
    /// See [`ReconcileService::refresh`].
    pub async fn refresh_entry(
        &self,
        session: &SessionContext,
        id: &EntryId,
        kind: EntryKind,
        policy: RefreshPolicy,
    ) -> Result<EntryDraft, CatalogError> {
        self.engine.refresh(session, id, kind, policy).await
    }

    /// Saves an entry and, for a series saved without taking ownership of
    /// its metadata, backfills every season right after.
    ///
    /// Backfill problems are reported in the result; only the entry write
    /// itself can fail the call.
    ///
    /// # Errors
    ///
    /// See [`ReconcileService::save`].
    pub async fn save_entry(
        &self,
        session: &SessionContext,
        id: &EntryId,
        kind: EntryKind,
        request: SaveRequest,
        cancel: &CancellationToken,
    ) -> Result<SavedEntry, CatalogError> {
        let outcome = self.engine.save(id, kind, request).await?;
        session.invalidate(id);

        self.emit(CatalogEvent::EntrySaved {
            entry_id: id.to_string(),
            admin_edited: outcome.entry.admin_edited(),
        });

        let mut saved = SavedEntry {
            entry: outcome.entry,
            backfill: None,
            backfill_error: None,
        };

        if outcome.backfill_due {
            match self.sync_series(id, cancel).await {
                Ok(report) => saved.backfill = Some(report),
                Err(e) => {
                    warn!(entry_id = %id, error = %e, "Backfill after save could not start");
                    saved.backfill_error = Some(e.to_string());
                }
            }
        }

        Ok(saved)
    }

    /// Saves the draft staged in `session` for `id`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] if no live draft is staged, otherwise as
    /// [`Self::save_entry`].
    pub async fn save_draft(
        &self,
        session: &SessionContext,
        id: &EntryId,
        cancel: &CancellationToken,
    ) -> Result<SavedEntry, CatalogError> {
        let draft = session
            .draft(id)
            .ok_or_else(|| CatalogError::NotFound(format!("staged draft for {id}")))?;
        let kind = draft.kind;
        self.save_entry(session, id, kind, draft.into_save_request(), cancel)
            .await
    }

    /// # Errors
    ///
    /// See [`SyncOrchestrator::sync_seasons`].
    pub async fn sync_series(
        &self,
        id: &EntryId,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, CatalogError> {
        let scope = format!("series:{id}");
        let mut sink = self.progress_sink(scope.clone());
        let result = self.sync.sync_seasons(id, &mut sink, cancel).await;
        self.finish(&scope, &result);
        result
    }

    /// Like [`Self::sync_series`], with a caller-side progress callback.
    ///
    /// # Errors
    ///
    /// See [`SyncOrchestrator::sync_seasons`].
    pub async fn sync_series_with(
        &self,
        id: &EntryId,
        on_progress: &mut (dyn FnMut(SyncProgress) + Send),
        cancel: &CancellationToken,
    ) -> Result<SyncReport, CatalogError> {
        let scope = format!("series:{id}");
        let mut sink = self.progress_sink(scope.clone());
        let mut both = |p: SyncProgress| {
            sink(p.clone());
            on_progress(p);
        };
        let result = self.sync.sync_seasons(id, &mut both, cancel).await;
        self.finish(&scope, &result);
        result
    }

    /// # Errors
    ///
    /// See [`SyncOrchestrator::sync_entries`].
    pub async fn sync_all(
        &self,
        on_progress: &mut (dyn FnMut(SyncProgress) + Send),
        cancel: &CancellationToken,
    ) -> Result<SyncReport, CatalogError> {
        let scope = "catalog".to_string();
        let mut sink = self.progress_sink(scope.clone());
        let mut both = |p: SyncProgress| {
            sink(p.clone());
            on_progress(p);
        };
        let result = self.sync.sync_entries(&mut both, cancel).await;
        self.finish(&scope, &result);
        result
    }

    /// # Errors
    ///
    /// See [`ReconcileService::save_episode`].
    pub async fn save_episode(
        &self,
        id: &EntryId,
        season: u32,
        fields: EpisodeInput,
        admin_edited: bool,
    ) -> Result<EpisodeMetadata, CatalogError> {
        self.engine
            .save_episode(id, season, fields, admin_edited)
            .await
    }

    /// # Errors
    ///
    /// See [`ReconcileService::refresh_episode`].
    pub async fn refresh_episode(
        &self,
        id: &EntryId,
        season: u32,
        episode: i32,
    ) -> Result<EpisodeInput, CatalogError> {
        self.engine.refresh_episode(id, season, episode).await
    }

    /// # Errors
    ///
    /// See [`ReconcileService::delete_episode`].
    pub async fn delete_episode(
        &self,
        id: &EntryId,
        season: u32,
        episode: i32,
    ) -> Result<bool, CatalogError> {
        self.engine.delete_episode(id, season, episode).await
    }

    /// # Errors
    ///
    /// See [`ReconcileService::delete_season`].
    pub async fn delete_season(&self, id: &EntryId, season: u32) -> Result<u64, CatalogError> {
        self.engine.delete_season(id, season).await
    }

    /// # Errors
    ///
    /// See [`TrashService::trash_entry`].
    pub async fn trash_entry(&self, id: &EntryId) -> Result<TrashedEntry, CatalogError> {
        let result = self.trash.trash_entry(id).await;
        self.emit_trashed(&result);
        result
    }

    /// # Errors
    ///
    /// See [`TrashService::trash_request`].
    pub async fn trash_request(&self, id: &str) -> Result<TrashedEntry, CatalogError> {
        let result = self.trash.trash_request(id).await;
        self.emit_trashed(&result);
        result
    }

    fn emit_trashed(&self, result: &Result<TrashedEntry, CatalogError>) {
        if let Ok(snapshot) = result {
            self.emit(CatalogEvent::Trashed {
                id: snapshot.id.clone(),
                origin: snapshot.origin.to_string(),
            });
        }
    }

    /// # Errors
    ///
    /// See [`TrashService::restore`].
    pub async fn restore(&self, id: &str) -> Result<RestoreOutcome, CatalogError> {
        let outcome = self.trash.restore(id).await?;
        if outcome.is_restored() {
            self.emit(CatalogEvent::Restored { id: id.to_string() });
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// See [`TrashService::permanently_delete`].
    pub async fn permanently_delete(&self, id: &str) -> Result<bool, CatalogError> {
        let removed = self.trash.permanently_delete(id).await?;
        if removed {
            self.emit(CatalogEvent::Purged { count: 1 });
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// See [`TrashService::empty_trash`].
    pub async fn empty_trash(&self) -> Result<usize, CatalogError> {
        let count = self.trash.empty_trash().await?;
        self.emit(CatalogEvent::Purged { count });
        Ok(count)
    }

    /// # Errors
    ///
    /// See [`TrashService::list`].
    pub async fn list_trash(&self) -> Result<Vec<TrashedEntry>, CatalogError> {
        self.trash.list().await
    }

    /// # Errors
    ///
    /// See [`TrashService::purge_expired`].
    pub async fn purge_expired(&self) -> Result<CleanupStats, CatalogError> {
        let stats = self.trash.purge_expired().await?;
        if stats.removed > 0 {
            self.emit(CatalogEvent::Purged {
                count: stats.removed,
            });
        }
        Ok(stats)
    }

    /// # Errors
    ///
    /// See [`SearchService::search`].
    pub async fn search(
        &self,
        query: &str,
        filter: CandidateFilter,
    ) -> Result<SearchResults, CatalogError> {
        self.search.search(query, filter).await
    }
}
