use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "episode_metadata")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entry_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub season_number: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub episode_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub vote_average: Option<f64>,
    pub admin_edited: bool,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::catalog_entries::Entity",
        from = "Column::EntryId",
        to = "super::catalog_entries::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CatalogEntries,
}

impl Related<super::catalog_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CatalogEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
