use crate::domain::EntryId;
use crate::entities::{episode_metadata, prelude::*};
use crate::models::episode::{EpisodeInput, EpisodeMetadata as EpisodeRow};
use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use sea_orm::sea_query::OnConflict;

/// Repository for per-episode metadata rows.
pub struct EpisodeRepository {
    conn: DatabaseConnection,
}

impl EpisodeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: episode_metadata::Model) -> Result<EpisodeRow> {
        Ok(EpisodeRow {
            entry_id: EntryId::parse(&m.entry_id)
                .with_context(|| format!("Episode row has malformed entry id {:?}", m.entry_id))?,
            season_number: m.season_number,
            episode_number: m.episode_number,
            name: m.name,
            overview: m.overview,
            still_url: m.still_url,
            air_date: m.air_date,
            runtime: m.runtime,
            vote_average: m.vote_average,
            admin_edited: m.admin_edited,
            updated_at: m.updated_at,
        })
    }

    fn on_conflict() -> OnConflict {
        OnConflict::columns([
            episode_metadata::Column::EntryId,
            episode_metadata::Column::SeasonNumber,
            episode_metadata::Column::EpisodeNumber,
        ])
        .update_columns([
            episode_metadata::Column::Name,
            episode_metadata::Column::Overview,
            episode_metadata::Column::StillUrl,
            episode_metadata::Column::AirDate,
            episode_metadata::Column::Runtime,
            episode_metadata::Column::VoteAverage,
            episode_metadata::Column::AdminEdited,
            episode_metadata::Column::UpdatedAt,
        ])
        .to_owned()
    }

    pub async fn list(&self, entry_id: &EntryId, season: Option<i32>) -> Result<Vec<EpisodeRow>> {
        let mut query =
            EpisodeMetadata::find().filter(episode_metadata::Column::EntryId.eq(entry_id.to_string()));

        if let Some(season) = season {
            query = query.filter(episode_metadata::Column::SeasonNumber.eq(season));
        }

        let rows = query
            .order_by_asc(episode_metadata::Column::SeasonNumber)
            .order_by_asc(episode_metadata::Column::EpisodeNumber)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    fn rows_for(entry_id: &EntryId, season: i32, episodes: &[EpisodeInput], now: &str) -> Vec<EpisodeRow> {
        episodes
            .iter()
            .map(|e| EpisodeRow {
                entry_id: entry_id.clone(),
                season_number: season,
                episode_number: e.episode_number,
                name: e.name.clone(),
                overview: e.overview.clone(),
                still_url: e.still_url.clone(),
                air_date: e.air_date.clone(),
                runtime: e.runtime,
                vote_average: e.vote_average,
                admin_edited: e.admin_edited,
                updated_at: now.to_string(),
            })
            .collect()
    }

    /// Writes a season's episodes as one all-or-nothing batch.
    ///
    /// Returns the episode numbers that were written; on error nothing was.
    pub async fn upsert_season(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        if episodes.is_empty() {
            return Ok(Vec::new());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let rows = Self::rows_for(entry_id, season, episodes, &now);

        let txn = self.conn.begin().await?;
        Self::insert_rows_on(&txn, &rows).await?;
        txn.commit().await?;

        Ok(rows.iter().map(|r| r.episode_number).collect())
    }

    /// Automatic variant of [`Self::upsert_season`]: a row whose stored
    /// `admin_edited` is set is left untouched, including one set by a
    /// save that commits while this batch is being prepared.
    ///
    /// Returns only the episode numbers actually written, ascending.
    pub async fn upsert_season_unowned(
        &self,
        entry_id: &EntryId,
        season: i32,
        episodes: &[EpisodeInput],
    ) -> Result<Vec<i32>> {
        if episodes.is_empty() {
            return Ok(Vec::new());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let rows: Vec<EpisodeRow> = Self::rows_for(entry_id, season, episodes, &now)
            .into_iter()
            .map(|mut r| {
                r.admin_edited = false;
                r
            })
            .collect();
        let numbers: Vec<i32> = rows.iter().map(|r| r.episode_number).collect();

        let mut conflict = Self::on_conflict();
        conflict.action_and_where(episode_metadata::Column::AdminEdited.eq(false));

        let txn = self.conn.begin().await?;
        Self::insert_rows_with(&txn, &rows, &conflict).await?;

        // Rows carrying this batch's stamp are the ones the conflict guard let through.
        let written = EpisodeMetadata::find()
            .filter(episode_metadata::Column::EntryId.eq(entry_id.to_string()))
            .filter(episode_metadata::Column::SeasonNumber.eq(season))
            .filter(episode_metadata::Column::EpisodeNumber.is_in(numbers))
            .filter(episode_metadata::Column::AdminEdited.eq(false))
            .filter(episode_metadata::Column::UpdatedAt.eq(now.as_str()))
            .order_by_asc(episode_metadata::Column::EpisodeNumber)
            .all(&txn)
            .await?;
        txn.commit().await?;

        Ok(written.into_iter().map(|m| m.episode_number).collect())
    }

    pub(crate) async fn insert_rows_on<C: ConnectionTrait>(conn: &C, rows: &[EpisodeRow]) -> Result<()> {
        Self::insert_rows_with(conn, rows, &Self::on_conflict()).await
    }

    async fn insert_rows_with<C: ConnectionTrait>(
        conn: &C,
        rows: &[EpisodeRow],
        conflict: &OnConflict,
    ) -> Result<()> {
        // SQLite caps bound parameters per statement; 11 columns * 80 rows stays under it.
        for chunk in rows.chunks(80) {
            let models: Vec<episode_metadata::ActiveModel> = chunk
                .iter()
                .map(|r| episode_metadata::ActiveModel {
                    entry_id: Set(r.entry_id.to_string()),
                    season_number: Set(r.season_number),
                    episode_number: Set(r.episode_number),
                    name: Set(r.name.clone()),
                    overview: Set(r.overview.clone()),
                    still_url: Set(r.still_url.clone()),
                    air_date: Set(r.air_date.clone()),
                    runtime: Set(r.runtime),
                    vote_average: Set(r.vote_average),
                    admin_edited: Set(r.admin_edited),
                    updated_at: Set(r.updated_at.clone()),
                })
                .collect();

            EpisodeMetadata::insert_many(models)
                .on_conflict(conflict.clone())
                .exec_without_returning(conn)
                .await?;
        }
        Ok(())
    }

    pub async fn delete_one(&self, entry_id: &EntryId, season: i32, episode: i32) -> Result<bool> {
        let result = EpisodeMetadata::delete_many()
            .filter(episode_metadata::Column::EntryId.eq(entry_id.to_string()))
            .filter(episode_metadata::Column::SeasonNumber.eq(season))
            .filter(episode_metadata::Column::EpisodeNumber.eq(episode))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete_season(&self, entry_id: &EntryId, season: i32) -> Result<u64> {
        let result = EpisodeMetadata::delete_many()
            .filter(episode_metadata::Column::EntryId.eq(entry_id.to_string()))
            .filter(episode_metadata::Column::SeasonNumber.eq(season))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected)
    }
}
