pub mod entry;
pub mod episode;
pub mod request;
