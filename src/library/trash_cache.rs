use crate::constants::trash::SNAPSHOT_EXTENSION;
use crate::models::trash::TrashedEntry;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Durable snapshot store for trashed records: one JSON file per id.
///
/// Lives on the local filesystem and never touches the primary store, so it
/// stays readable while the database is down.
#[derive(Clone)]
pub struct TrashCache {
    path: PathBuf,

    retention_days: u32,
}

impl TrashCache {
    pub fn new(path: impl Into<PathBuf>, retention_days: u32) -> Self {
        Self {
            path: path.into(),
            retention_days,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.path)
            .await
            .with_context(|| format!("Failed to create trash dir {}", self.path.display()))?;
        Ok(())
    }

    fn snapshot_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!("Invalid trash id: {id:?}");
        }
        Ok(self.path.join(format!("{id}.{SNAPSHOT_EXTENSION}")))
    }

    /// Writes (or replaces) the snapshot for `entry.id`.
    ///
    /// The file is written next to its final name and renamed into place, so
    /// a reader never sees a half-written snapshot.
    pub async fn put(&self, entry: &TrashedEntry) -> Result<()> {
        self.ensure_exists().await?;

        let target = self.snapshot_path(&entry.id)?;
        let staging = self.path.join(format!(".{}.tmp", entry.id));
        let body = serde_json::to_vec_pretty(entry)?;

        fs::write(&staging, body)
            .await
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        fs::rename(&staging, &target)
            .await
            .with_context(|| format!("Failed to move snapshot into {}", target.display()))?;

        debug!(id = %entry.id, path = %target.display(), "Trash snapshot written");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<TrashedEntry>> {
        let path = self.snapshot_path(id)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes).with_context(|| {
                format!("Corrupt trash snapshot {}", path.display())
            })?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Removes one snapshot. Returns `false` when there was none.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let path = self.snapshot_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }

    /// All snapshots, most recently deleted first. Unreadable files are
    /// skipped with a warning.
    pub async fn list(&self) -> Result<Vec<TrashedEntry>> {
        let mut snapshots = Vec::new();

        for path in self.snapshot_files().await? {
            match fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<TrashedEntry>(&bytes) {
                    Ok(entry) => snapshots.push(entry),
                    Err(e) => warn!("Skipping corrupt trash snapshot {:?}: {}", path, e),
                },
                Err(e) => warn!("Failed to read trash snapshot {:?}: {}", path, e),
            }
        }

        snapshots.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then(a.id.cmp(&b.id)));
        Ok(snapshots)
    }

    /// Deletes every snapshot.
    pub async fn clear(&self) -> Result<CleanupStats> {
        let mut stats = CleanupStats::default();

        for path in self.snapshot_files().await? {
            match fs::remove_file(&path).await {
                Ok(()) => stats.removed += 1,
                Err(e) => {
                    warn!("Failed to delete {:?}: {}", path, e);
                    stats.errors += 1;
                }
            }
        }

        info!("Emptied trash: deleted {} snapshots", stats.removed);
        Ok(stats)
    }

    /// Deletes snapshots older than the configured retention. A retention of
    /// zero days keeps everything.
    pub async fn cleanup(&self) -> Result<CleanupStats> {
        if self.retention_days == 0 {
            return Ok(CleanupStats::default());
        }

        let cutoff = Utc::now() - chrono::Duration::days(i64::from(self.retention_days));
        self.purge_older_than(cutoff).await
    }

    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<CleanupStats> {
        let mut stats = CleanupStats::default();

        for entry in self.list().await? {
            let Ok(deleted_at) = DateTime::parse_from_rfc3339(&entry.deleted_at) else {
                warn!(id = %entry.id, "Trash snapshot has an unreadable deletion time");
                stats.errors += 1;
                continue;
            };

            if deleted_at.with_timezone(&Utc) >= cutoff {
                continue;
            }

            match self.remove(&entry.id).await {
                Ok(_) => {
                    debug!(id = %entry.id, "Purged expired trash snapshot");
                    stats.removed += 1;
                    stats.purged_ids.push(entry.id);
                }
                Err(e) => {
                    warn!("Failed to purge {}: {}", entry.id, e);
                    stats.errors += 1;
                }
            }
        }

        if stats.removed > 0 {
            info!("Trash cleanup: purged {} snapshots", stats.removed);
        }

        Ok(stats)
    }

    async fn snapshot_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(files);
        }

        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_snapshot = path
                .extension()
                .is_some_and(|ext| ext == SNAPSHOT_EXTENSION);
            let is_staging = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'));

            if is_snapshot && !is_staging && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

#[derive(Debug, Default)]
pub struct CleanupStats {
    pub removed: usize,
    pub errors: usize,
    pub purged_ids: Vec<String>,
}
