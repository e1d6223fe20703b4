//! Domain events for the catalog.
//!
//! Events are sent on the event bus so the presentation layer can follow
//! long-running operations without polling.

use serde::Serialize;

/// Events broadcast to subscribers of the catalog event bus.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum CatalogEvent {
    EntrySaved {
        entry_id: String,
        admin_edited: bool,
    },

    SyncProgress {
        scope: String,
        current: usize,
        total: usize,
        message: String,
    },
    SyncFinished {
        scope: String,
        succeeded: usize,
        failed: usize,
        cancelled: bool,
    },

    Trashed {
        id: String,
        origin: String,
    },
    Restored {
        id: String,
    },
    Purged {
        count: usize,
    },

    Error {
        message: String,
    },
}
