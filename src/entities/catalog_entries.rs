use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "catalog_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    /// JSON-encoded `EntryContent`.
    pub content: String,
    pub title: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub logo_url: Option<String>,
    pub hover_image_url: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub runtime: Option<i32>,
    pub season_count: Option<i32>,
    pub episode_count: Option<i32>,
    /// JSON array of genre names.
    pub genres: Option<String>,
    /// JSON array of cast members.
    pub cast: Option<String>,
    pub imdb_id: Option<String>,
    /// Bitset of operator-owned field groups.
    pub overrides: i32,
    /// Mirrors the metadata bit of `overrides`.
    pub admin_edited: bool,
    pub created_at: String,
    pub media_updated_at: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::episode_metadata::Entity")]
    EpisodeMetadata,
}

impl Related<super::episode_metadata::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EpisodeMetadata.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
