//! Batch season/entry sync.
//!
//! Units run one at a time, in order, each behind the shared pacing
//! limiter. A failing unit is counted and the batch moves on; only a
//! broken precondition (entry missing, store unreachable, season list
//! unavailable) aborts the whole call.

use crate::db::CatalogStore;
use crate::domain::{CatalogError, EntryId, EntryKind};
use crate::models::entry::Entry;
use crate::services::rate_limit::RateLimiter;
use crate::services::reconcile::ReconcileService;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Progress after one finished unit. `current` counts finished units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub total: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Stopped early on request; `attempted < total`.
    pub cancelled: bool,
}

impl SyncReport {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.attempted == self.total
    }

    fn record(&mut self, ok: bool) {
        self.attempted += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        let outcome = if ok { "success" } else { "failure" };
        metrics::counter!("catalog_sync_units_total", "outcome" => outcome).increment(1);
    }
}

pub type ProgressFn<'a> = dyn FnMut(SyncProgress) + Send + 'a;

pub struct SyncOrchestrator {
    engine: Arc<ReconcileService>,
    limiter: Arc<RateLimiter>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(engine: Arc<ReconcileService>, limiter: Arc<RateLimiter>) -> Self {
        Self { engine, limiter }
    }

    fn store(&self) -> &Arc<dyn CatalogStore> {
        self.engine.store()
    }

    /// Backfills every upstream season of one series, ascending.
    ///
    /// # Errors
    ///
    /// Only whole-batch preconditions: [`CatalogError::NotFound`] if the
    /// entry is not stored, [`CatalogError::InvalidInput`] if it is a movie,
    /// [`CatalogError::StoreUnavailable`] if it can't be read, and the
    /// provider error if the season list can't be fetched.
    pub async fn sync_seasons(
        &self,
        id: &EntryId,
        progress: &mut ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, CatalogError> {
        let entry = self
            .store()
            .get_entry(id)
            .await
            .map_err(CatalogError::read)?
            .ok_or_else(|| CatalogError::NotFound(format!("entry {id}")))?;

        if entry.kind != EntryKind::Series {
            return Err(CatalogError::InvalidInput(format!(
                "{id} is a {}, it has no seasons",
                entry.kind
            )));
        }

        self.limiter.acquire().await;
        let details = self
            .engine
            .provider()
            .fetch_details(id, EntryKind::Series)
            .await?;

        let mut seasons: Vec<u32> = details.seasons.iter().map(|s| s.season_number).collect();
        seasons.sort_unstable();
        seasons.dedup();

        let start = Instant::now();
        info!(
            event = "season_sync_started",
            entry_id = %id,
            seasons = seasons.len(),
            "Syncing seasons"
        );

        let mut report = SyncReport::new(seasons.len());

        for season in seasons {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            self.limiter.acquire().await;
            let message = match self.engine.backfill_season(id, season).await {
                Ok(done) => {
                    report.record(true);
                    format!(
                        "Season {season}: {} written, {} kept",
                        done.written.len(),
                        done.skipped_admin.len()
                    )
                }
                Err(e) => {
                    warn!(entry_id = %id, season, error = %e, "Season backfill failed");
                    report.record(false);
                    format!("Season {season} failed: {e}")
                }
            };

            progress(SyncProgress {
                current: report.attempted,
                total: report.total,
                message,
            });
        }

        info!(
            event = "season_sync_finished",
            entry_id = %id,
            processed = report.attempted,
            failed = report.failed,
            cancelled = report.cancelled,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Season sync complete"
        );

        Ok(report)
    }

    /// Refreshes every stored entry in store order. For a series the unit
    /// also backfills each upstream season; it fails if any step fails.
    ///
    /// # Errors
    ///
    /// [`CatalogError::StoreUnavailable`] if the entry list can't be read.
    pub async fn sync_entries(
        &self,
        progress: &mut ProgressFn<'_>,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, CatalogError> {
        let entries = self
            .store()
            .list_entries()
            .await
            .map_err(CatalogError::read)?;

        let start = Instant::now();
        info!(
            event = "entry_sync_started",
            entries = entries.len(),
            "Syncing catalog entries"
        );

        let mut report = SyncReport::new(entries.len());

        for entry in &entries {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let result = self.sync_entry(entry).await;
            let title = if entry.metadata.title.is_empty() {
                entry.id.to_string()
            } else {
                entry.metadata.title.clone()
            };

            let message = match result {
                Ok(()) => {
                    report.record(true);
                    format!("Synced {title}")
                }
                Err(e) => {
                    warn!(entry_id = %entry.id, error = %e, "Entry sync failed");
                    report.record(false);
                    format!("{title} failed: {e}")
                }
            };

            progress(SyncProgress {
                current: report.attempted,
                total: report.total,
                message,
            });
        }

        info!(
            event = "entry_sync_finished",
            processed = report.attempted,
            failed = report.failed,
            cancelled = report.cancelled,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Entry sync complete"
        );

        Ok(report)
    }

    async fn sync_entry(&self, entry: &Entry) -> Result<(), CatalogError> {
        self.limiter.acquire().await;
        let refreshed = self.engine.apply_automatic_refresh(entry).await?;

        if entry.kind != EntryKind::Series {
            return Ok(());
        }

        let mut first_error = None;
        for season in refreshed.seasons {
            self.limiter.acquire().await;
            if let Err(e) = self.engine.backfill_season(&entry.id, season).await {
                debug!(entry_id = %entry.id, season, error = %e, "Season step failed");
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
