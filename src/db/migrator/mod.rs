use sea_orm_migration::prelude::*;

mod m20240101_initial;
mod m20260121_add_episode_season_index;
mod m20260128_add_content_requests;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_initial::Migration),
            Box::new(m20260121_add_episode_season_index::Migration),
            Box::new(m20260128_add_content_requests::Migration),
        ]
    }
}
