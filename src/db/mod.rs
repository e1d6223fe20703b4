use crate::domain::EntryId;
use crate::models::entry::Entry;
use crate::models::episode::{EpisodeInput, EpisodeMetadata};
use crate::models::request::ContentRequest;
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Typed access to the primary record store.
///
/// Every multi-row write is all-or-nothing and reports the rows it wrote.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>>;

    async fn list_entries(&self) -> Result<Vec<Entry>>;

    async fn search_entries(&self, query: &str, limit: u64) -> Result<Vec<Entry>>;

    async fn upsert_entry(&self, entry: &Entry) -> Result<()>;

    /// Removes the entry and its episode rows. Returns whether it existed.
    async fn delete_entry(&self, id: &EntryId) -> Result<bool>;

    /// Create-or-overwrite an entry along with its complete episode set.
    async fn restore_entry(&self, entry: &Entry, episodes: &[EpisodeMetadata]) -> Result<()>;

    async fn list_episodes(
        &self,
        entry_id: &EntryId,
        season: Option<i32>,
    ) -> Result<Vec<EpisodeMetadata>>;

    /// Writes every row verbatim, flags included. Returns the episode
    /// numbers written.
    async fn upsert_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>>;

    /// Writes upstream rows with `admin_edited = false`, skipping any row
    /// whose stored flag is set at the moment of the write. Returns only
    /// the episode numbers written.
    async fn upsert_unowned_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>>;

    async fn delete_episode(&self, entry_id: &EntryId, season: i32, episode: i32) -> Result<bool>;

    async fn delete_season(&self, entry_id: &EntryId, season: i32) -> Result<u64>;

    async fn get_request(&self, id: &str) -> Result<Option<ContentRequest>>;

    async fn list_requests(&self) -> Result<Vec<ContentRequest>>;

    async fn upsert_request(&self, request: &ContentRequest) -> Result<()>;

    async fn delete_request(&self, id: &str) -> Result<bool>;
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn entry_repo(&self) -> repositories::entry::EntryRepository {
        repositories::entry::EntryRepository::new(self.conn.clone())
    }

    fn episode_repo(&self) -> repositories::episode::EpisodeRepository {
        repositories::episode::EpisodeRepository::new(self.conn.clone())
    }

    fn request_repo(&self) -> repositories::request::RequestRepository {
        repositories::request::RequestRepository::new(self.conn.clone())
    }
}

#[async_trait::async_trait]
impl CatalogStore for Store {
    async fn get_entry(&self, id: &EntryId) -> Result<Option<Entry>> {
        self.entry_repo().get(id).await
    }

    async fn list_entries(&self) -> Result<Vec<Entry>> {
        self.entry_repo().list_all().await
    }

    async fn search_entries(&self, query: &str, limit: u64) -> Result<Vec<Entry>> {
        self.entry_repo().search_by_title(query, limit).await
    }

    async fn upsert_entry(&self, entry: &Entry) -> Result<()> {
        self.entry_repo().upsert(entry).await
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<bool> {
        self.entry_repo().delete(id).await
    }

    async fn restore_entry(&self, entry: &Entry, episodes: &[EpisodeMetadata]) -> Result<()> {
        self.entry_repo()
            .replace_with_episodes(entry, episodes)
            .await
    }

    async fn list_episodes(
        &self,
        entry_id: &EntryId,
        season: Option<i32>,
    ) -> Result<Vec<EpisodeMetadata>> {
        self.episode_repo().list(entry_id, season).await
    }

    async fn upsert_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        self.episode_repo()
            .upsert_season(entry_id, season, episodes)
            .await
    }

    async fn upsert_unowned_episodes(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        self.episode_repo()
            .upsert_season_unowned(entry_id, season, episodes)
            .await
    }

    async fn delete_episode(&self, entry_id: &EntryId, season: i32, episode: i32) -> Result<bool> {
        self.episode_repo()
            .delete_one(entry_id, season, episode)
            .await
    }

    async fn delete_season(&self, entry_id: &EntryId, season: i32) -> Result<u64> {
        self.episode_repo().delete_season(entry_id, season).await
    }

    async fn get_request(&self, id: &str) -> Result<Option<ContentRequest>> {
        self.request_repo().get(id).await
    }

    async fn list_requests(&self) -> Result<Vec<ContentRequest>> {
        self.request_repo().list().await
    }

    async fn upsert_request(&self, request: &ContentRequest) -> Result<()> {
        self.request_repo().upsert(request).await
    }

    async fn delete_request(&self, id: &str) -> Result<bool> {
        self.request_repo().delete(id).await
    }
}
