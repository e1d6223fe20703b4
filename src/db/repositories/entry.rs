use crate::domain::{EntryId, EntryKind, OverrideSet};
use crate::entities::{catalog_entries, episode_metadata, prelude::*};
use crate::models::entry::{CastMember, Entry, EntryContent, EntryMetadata};
use crate::models::episode::EpisodeMetadata as EpisodeRow;
use anyhow::{Context, Result};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info};

use super::episode::EpisodeRepository;

/// A NULL column reads as an empty list.
fn json_list<T: serde::de::DeserializeOwned>(raw: Option<&str>) -> Result<Vec<T>> {
    Ok(raw.map(serde_json::from_str).transpose()?.unwrap_or_default())
}

/// Substring LIKE pattern in which `%`, `_` and `\` match literally.
/// Pair with an `ESCAPE '\'` clause.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for catalog entries.
pub struct EntryRepository {
    conn: DatabaseConnection,
}

impl EntryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: catalog_entries::Model) -> Result<Entry> {
        let id = EntryId::parse(&model.id)
            .with_context(|| format!("Stored entry has malformed id {:?}", model.id))?;
        let kind = EntryKind::from_db(&model.kind)
            .ok_or_else(|| anyhow::anyhow!("Entry {} has unknown kind {:?}", model.id, model.kind))?;
        let content: EntryContent = serde_json::from_str(&model.content)
            .with_context(|| format!("Entry {} has unreadable content", model.id))?;
        let genres: Vec<String> = json_list(model.genres.as_deref())
            .with_context(|| format!("Entry {} has unreadable genres", model.id))?;
        let cast: Vec<CastMember> = json_list(model.cast.as_deref())
            .with_context(|| format!("Entry {} has unreadable cast", model.id))?;

        Ok(Entry {
            id,
            kind,
            content,
            metadata: EntryMetadata {
                title: model.title,
                poster_url: model.poster_url,
                backdrop_url: model.backdrop_url,
                logo_url: model.logo_url,
                hover_image_url: model.hover_image_url,
                overview: model.overview,
                tagline: model.tagline,
                status: model.status,
                release_date: model.release_date,
                vote_average: model.vote_average,
                vote_count: model.vote_count,
                runtime: model.runtime,
                season_count: model.season_count,
                episode_count: model.episode_count,
                genres,
                cast,
                imdb_id: model.imdb_id,
            },
            overrides: OverrideSet::from_bits(model.overrides),
            created_at: model.created_at,
            media_updated_at: model.media_updated_at,
        })
    }

    fn active_model(entry: &Entry) -> Result<catalog_entries::ActiveModel> {
        let m = &entry.metadata;
        Ok(catalog_entries::ActiveModel {
            id: Set(entry.id.to_string()),
            kind: Set(entry.kind.as_str().to_string()),
            content: Set(serde_json::to_string(&entry.content)?),
            title: Set(m.title.clone()),
            poster_url: Set(m.poster_url.clone()),
            backdrop_url: Set(m.backdrop_url.clone()),
            logo_url: Set(m.logo_url.clone()),
            hover_image_url: Set(m.hover_image_url.clone()),
            overview: Set(m.overview.clone()),
            tagline: Set(m.tagline.clone()),
            status: Set(m.status.clone()),
            release_date: Set(m.release_date.clone()),
            vote_average: Set(m.vote_average),
            vote_count: Set(m.vote_count),
            runtime: Set(m.runtime),
            season_count: Set(m.season_count),
            episode_count: Set(m.episode_count),
            genres: Set(Some(serde_json::to_string(&m.genres)?)),
            cast: Set(Some(serde_json::to_string(&m.cast)?)),
            imdb_id: Set(m.imdb_id.clone()),
            overrides: Set(entry.overrides.bits()),
            admin_edited: Set(entry.overrides.admin_edited()),
            created_at: Set(entry.created_at.clone()),
            media_updated_at: Set(entry.media_updated_at.clone()),
        })
    }

    pub async fn get(&self, id: &EntryId) -> Result<Option<Entry>> {
        let model = CatalogEntries::find_by_id(id.to_string())
            .one(&self.conn)
            .await?;

        model.map(Self::map_model).transpose()
    }

    /// Entries in the order the store returns them for batch work.
    pub async fn list_all(&self) -> Result<Vec<Entry>> {
        let rows = CatalogEntries::find()
            .order_by_asc(catalog_entries::Column::CreatedAt)
            .order_by_asc(catalog_entries::Column::Id)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn search_by_title(&self, query: &str, limit: u64) -> Result<Vec<Entry>> {
        let pattern = LikeExpr::new(contains_pattern(query)).escape('\\');
        let rows = CatalogEntries::find()
            .filter(catalog_entries::Column::Title.like(pattern))
            .order_by_asc(catalog_entries::Column::Title)
            .limit(limit)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn upsert(&self, entry: &Entry) -> Result<()> {
        Self::upsert_on(&self.conn, entry).await?;
        debug!(entry_id = %entry.id, "Upserted entry");
        Ok(())
    }

    async fn upsert_on<C: ConnectionTrait>(conn: &C, entry: &Entry) -> Result<()> {
        CatalogEntries::insert(Self::active_model(entry)?)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(catalog_entries::Column::Id)
                    .update_columns([
                        catalog_entries::Column::Kind,
                        catalog_entries::Column::Content,
                        catalog_entries::Column::Title,
                        catalog_entries::Column::PosterUrl,
                        catalog_entries::Column::BackdropUrl,
                        catalog_entries::Column::LogoUrl,
                        catalog_entries::Column::HoverImageUrl,
                        catalog_entries::Column::Overview,
                        catalog_entries::Column::Tagline,
                        catalog_entries::Column::Status,
                        catalog_entries::Column::ReleaseDate,
                        catalog_entries::Column::VoteAverage,
                        catalog_entries::Column::VoteCount,
                        catalog_entries::Column::Runtime,
                        catalog_entries::Column::SeasonCount,
                        catalog_entries::Column::EpisodeCount,
                        catalog_entries::Column::Genres,
                        catalog_entries::Column::Cast,
                        catalog_entries::Column::ImdbId,
                        catalog_entries::Column::Overrides,
                        catalog_entries::Column::AdminEdited,
                        catalog_entries::Column::CreatedAt,
                        catalog_entries::Column::MediaUpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Deletes the entry and all of its episode rows in one transaction.
    pub async fn delete(&self, id: &EntryId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        EpisodeMetadata::delete_many()
            .filter(episode_metadata::Column::EntryId.eq(id.to_string()))
            .exec(&txn)
            .await?;

        let result = CatalogEntries::delete_by_id(id.to_string())
            .exec(&txn)
            .await?;

        txn.commit().await?;

        if result.rows_affected > 0 {
            info!(entry_id = %id, "Deleted entry");
        }
        Ok(result.rows_affected > 0)
    }

    /// Writes an entry together with a full set of episode rows, replacing
    /// whatever episodes were stored for it.
    pub async fn replace_with_episodes(&self, entry: &Entry, episodes: &[EpisodeRow]) -> Result<()> {
        let txn = self.conn.begin().await?;

        Self::upsert_on(&txn, entry).await?;

        EpisodeMetadata::delete_many()
            .filter(episode_metadata::Column::EntryId.eq(entry.id.to_string()))
            .exec(&txn)
            .await?;

        EpisodeRepository::insert_rows_on(&txn, episodes).await?;

        txn.commit().await?;
        Ok(())
    }
}
