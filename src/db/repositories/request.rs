use crate::domain::{EntryId, EntryKind};
use crate::entities::{content_requests, prelude::*};
use crate::models::request::ContentRequest;
use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, Set};

/// Repository for content requests.
pub struct RequestRepository {
    conn: DatabaseConnection,
}

impl RequestRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: content_requests::Model) -> Result<ContentRequest> {
        let kind = EntryKind::from_db(&m.kind)
            .ok_or_else(|| anyhow::anyhow!("Request {} has unknown kind {:?}", m.id, m.kind))?;

        Ok(ContentRequest {
            id: m.id,
            kind,
            provider_id: m.provider_id.and_then(|p| EntryId::parse(&p).ok()),
            title: m.title,
            poster_url: m.poster_url,
            note: m.note,
            requested_at: m.requested_at,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<ContentRequest>> {
        let model = ContentRequests::find_by_id(id.to_string())
            .one(&self.conn)
            .await?;

        model.map(Self::map_model).transpose()
    }

    pub async fn list(&self) -> Result<Vec<ContentRequest>> {
        let rows = ContentRequests::find()
            .order_by_desc(content_requests::Column::RequestedAt)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn upsert(&self, request: &ContentRequest) -> Result<()> {
        let active_model = content_requests::ActiveModel {
            id: Set(request.id.clone()),
            kind: Set(request.kind.as_str().to_string()),
            provider_id: Set(request.provider_id.as_ref().map(ToString::to_string)),
            title: Set(request.title.clone()),
            poster_url: Set(request.poster_url.clone()),
            note: Set(request.note.clone()),
            requested_at: Set(request.requested_at.clone()),
        };

        ContentRequests::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(content_requests::Column::Id)
                    .update_columns([
                        content_requests::Column::Kind,
                        content_requests::Column::ProviderId,
                        content_requests::Column::Title,
                        content_requests::Column::PosterUrl,
                        content_requests::Column::Note,
                        content_requests::Column::RequestedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = ContentRequests::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
