pub mod trash_cache;
pub use trash_cache::{CleanupStats, TrashCache};
