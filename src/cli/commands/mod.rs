mod resolve;
mod search;
mod sync;
mod trash;

pub use resolve::cmd_resolve;
pub use search::cmd_search;
pub use sync::{cmd_sync_all, cmd_sync_series};
pub use trash::{
    cmd_trash_add, cmd_trash_cleanup, cmd_trash_empty, cmd_trash_list, cmd_trash_purge,
    cmd_trash_restore,
};
