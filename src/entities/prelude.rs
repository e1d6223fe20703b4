pub use super::catalog_entries::Entity as CatalogEntries;
pub use super::content_requests::Entity as ContentRequests;
pub use super::episode_metadata::Entity as EpisodeMetadata;
