use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_episode_metadata_entry_season")
                    .table(EpisodeMetadata::Table)
                    .col(EpisodeMetadata::EntryId)
                    .col(EpisodeMetadata::SeasonNumber)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_catalog_entries_title")
                    .table(CatalogEntries::Table)
                    .col(CatalogEntries::Title)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_catalog_entries_title")
                    .table(CatalogEntries::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_episode_metadata_entry_season")
                    .table(EpisodeMetadata::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum EpisodeMetadata {
    #[sea_orm(iden = "episode_metadata")]
    Table,
    EntryId,
    SeasonNumber,
}

#[derive(DeriveIden)]
enum CatalogEntries {
    #[sea_orm(iden = "catalog_entries")]
    Table,
    Title,
}
