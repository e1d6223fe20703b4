//! Soft-delete lifecycle: active -> trashed -> (restored | purged).
//!
//! The snapshot is always written to the trash cache before the primary
//! store delete is issued. The cache is the only record of what can be
//! recovered; the store keeps no history.

use crate::db::CatalogStore;
use crate::domain::{CatalogError, EntryId, EntryKind};
use crate::library::trash_cache::{CleanupStats, TrashCache};
use crate::models::trash::{OriginCategory, TrashableRecord, TrashedEntry};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a restore: restore of an id that is not in the trash is a
/// no-op rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    Restored(Box<TrashedEntry>),
    NotFound,
}

impl RestoreOutcome {
    #[must_use]
    pub const fn is_restored(&self) -> bool {
        matches!(self, Self::Restored(_))
    }
}

pub struct TrashService {
    store: Arc<dyn CatalogStore>,
    cache: TrashCache,
}

fn count_op(op: &'static str) {
    metrics::counter!("catalog_trash_operations_total", "op" => op).increment(1);
}

impl TrashService {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, cache: TrashCache) -> Self {
        Self { store, cache }
    }

    #[must_use]
    pub const fn cache(&self) -> &TrashCache {
        &self.cache
    }

    /// Snapshots `record` into the trash, then deletes it from the store.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Trash`] if the snapshot can't be written; the
    ///   store is not touched
    /// - [`CatalogError::StoreWriteFailed`] if the delete fails; the
    ///   snapshot stays in the trash
    pub async fn move_to_trash(
        &self,
        record: TrashableRecord,
        origin: OriginCategory,
    ) -> Result<TrashedEntry, CatalogError> {
        let snapshot = TrashedEntry::snapshot(record, origin);

        self.cache
            .put(&snapshot)
            .await
            .map_err(|e| CatalogError::Trash(format!("{e:#}")))?;

        let deleted = match &snapshot.record {
            TrashableRecord::Entry { entry, .. } => self.store.delete_entry(&entry.id).await,
            TrashableRecord::Request(request) => self.store.delete_request(&request.id).await,
        };

        match deleted {
            Ok(existed) => {
                if !existed {
                    warn!(id = %snapshot.id, "Trashed record was already gone from the store");
                }
                count_op("trash");
                info!(id = %snapshot.id, origin = %origin, "Moved to trash");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    id = %snapshot.id,
                    error = %e,
                    "Store delete failed after snapshot, record kept in trash"
                );
                Err(CatalogError::write(e))
            }
        }
    }

    /// Trashes a stored entry together with its episode rows.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NotFound`] if the entry is not stored, otherwise as
    /// [`Self::move_to_trash`].
    pub async fn trash_entry(&self, id: &EntryId) -> Result<TrashedEntry, CatalogError> {
        let entry = self
            .store
            .get_entry(id)
            .await
            .map_err(CatalogError::read)?
            .ok_or_else(|| CatalogError::NotFound(format!("entry {id}")))?;

        let episodes = if entry.kind == EntryKind::Series {
            self.store
                .list_episodes(id, None)
                .await
                .map_err(CatalogError::read)?
        } else {
            Vec::new()
        };

        let origin = OriginCategory::for_kind(entry.kind);
        self.move_to_trash(TrashableRecord::Entry { entry, episodes }, origin)
            .await
    }

    /// # Errors
    ///
    /// [`CatalogError::NotFound`] if the request is not stored, otherwise as
    /// [`Self::move_to_trash`].
    pub async fn trash_request(&self, id: &str) -> Result<TrashedEntry, CatalogError> {
        let request = self
            .store
            .get_request(id)
            .await
            .map_err(CatalogError::read)?
            .ok_or_else(|| CatalogError::NotFound(format!("request {id}")))?;

        self.move_to_trash(TrashableRecord::Request(request), OriginCategory::Requests)
            .await
    }

    /// Upserts the snapshot back into the store and drops it from the trash.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Trash`] if the cache can't be read
    /// - [`CatalogError::StoreWriteFailed`] if the upsert fails; the
    ///   snapshot stays in the trash
    pub async fn restore(&self, id: &str) -> Result<RestoreOutcome, CatalogError> {
        let Some(snapshot) = self.cache.get(id).await.map_err(trash_err)? else {
            info!(id, "Restore requested for an id that is not in the trash");
            return Ok(RestoreOutcome::NotFound);
        };

        let written = match &snapshot.record {
            TrashableRecord::Entry { entry, episodes } => {
                self.store.restore_entry(entry, episodes).await
            }
            TrashableRecord::Request(request) => self.store.upsert_request(request).await,
        };
        written.map_err(CatalogError::write)?;

        self.cache.remove(id).await.map_err(trash_err)?;

        count_op("restore");
        info!(id, origin = %snapshot.origin, "Restored from trash");
        Ok(RestoreOutcome::Restored(Box::new(snapshot)))
    }

    /// Drops one snapshot. The primary store is never touched.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Trash`] on cache I/O failure.
    pub async fn permanently_delete(&self, id: &str) -> Result<bool, CatalogError> {
        let removed = self.cache.remove(id).await.map_err(trash_err)?;
        if removed {
            count_op("purge");
            info!(id, "Permanently deleted from trash");
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// [`CatalogError::Trash`] on cache I/O failure.
    pub async fn empty_trash(&self) -> Result<usize, CatalogError> {
        let stats = self.cache.clear().await.map_err(trash_err)?;
        if stats.errors > 0 {
            return Err(CatalogError::Trash(format!(
                "{} snapshots could not be deleted",
                stats.errors
            )));
        }
        count_op("empty");
        Ok(stats.removed)
    }

    /// # Errors
    ///
    /// [`CatalogError::Trash`] on cache I/O failure.
    pub async fn list(&self) -> Result<Vec<TrashedEntry>, CatalogError> {
        self.cache.list().await.map_err(trash_err)
    }

    /// Purges snapshots older than the retention period.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Trash`] on cache I/O failure.
    pub async fn purge_expired(&self) -> Result<CleanupStats, CatalogError> {
        let stats = self.cache.cleanup().await.map_err(trash_err)?;
        if stats.removed > 0 {
            count_op("expire");
        }
        Ok(stats)
    }
}

fn trash_err(err: anyhow::Error) -> CatalogError {
    CatalogError::Trash(format!("{err:#}"))
}
