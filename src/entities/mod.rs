pub mod prelude;

pub mod catalog_entries;
pub mod content_requests;
pub mod episode_metadata;
