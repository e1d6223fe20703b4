//! Operator session state: staged drafts produced by an explicit refresh.
//!
//! Drafts live only as long as the session that created them and expire
//! after a fixed TTL. Nothing here touches the store.

use crate::domain::{EntryId, EntryKind};
use crate::models::entry::{EntryContent, EntryMetadata};
use crate::services::reconcile::SaveRequest;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Editable working copy of an entry, staged from upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryDraft {
    pub id: EntryId,
    pub kind: EntryKind,
    pub metadata: EntryMetadata,
    pub content: EntryContent,
    /// Metadata flag the draft proposes to save with.
    pub admin_edited: bool,
    /// Links flag the draft proposes to save with.
    pub links_admin_edited: bool,
    /// Season numbers the provider reported, ascending.
    pub upstream_seasons: Vec<u32>,
    pub fetched_at: String,
}

impl EntryDraft {
    /// Turns the draft into a save of both field groups, each with its own
    /// flag.
    #[must_use]
    pub fn into_save_request(self) -> SaveRequest {
        SaveRequest {
            metadata: Some(self.metadata),
            content: Some(self.content),
            admin_edited: self.admin_edited,
            links_admin_edited: Some(self.links_admin_edited),
        }
    }
}

struct StagedDraft {
    draft: EntryDraft,
    staged_at: Instant,
}

/// Per-session draft cache with TTL and explicit invalidation.
pub struct SessionContext {
    ttl: Duration,
    drafts: Mutex<HashMap<EntryId, StagedDraft>>,
}

impl SessionContext {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            drafts: Mutex::new(HashMap::new()),
        }
    }

    fn with_drafts<T>(&self, f: impl FnOnce(&mut HashMap<EntryId, StagedDraft>) -> T) -> T {
        let mut drafts = self.drafts.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut drafts)
    }

    /// Stages `draft`, replacing any earlier draft for the same id.
    pub fn stage(&self, draft: EntryDraft) {
        self.with_drafts(|drafts| {
            drafts.insert(
                draft.id.clone(),
                StagedDraft {
                    draft,
                    staged_at: Instant::now(),
                },
            );
        });
    }

    /// The live draft for `id`. Expired drafts are dropped on access.
    #[must_use]
    pub fn draft(&self, id: &EntryId) -> Option<EntryDraft> {
        let ttl = self.ttl;
        self.with_drafts(|drafts| {
            let expired = drafts
                .get(id)
                .is_some_and(|staged| staged.staged_at.elapsed() >= ttl);
            if expired {
                drafts.remove(id);
                return None;
            }
            drafts.get(id).map(|staged| staged.draft.clone())
        })
    }

    /// Drops the draft for `id`. Returns whether one was staged.
    pub fn invalidate(&self, id: &EntryId) -> bool {
        self.with_drafts(|drafts| drafts.remove(id).is_some())
    }

    pub fn clear(&self) {
        self.with_drafts(HashMap::clear);
    }

    /// Number of drafts that have not expired.
    #[must_use]
    pub fn len(&self) -> usize {
        let ttl = self.ttl;
        self.with_drafts(|drafts| {
            drafts.retain(|_, staged| staged.staged_at.elapsed() < ttl);
            drafts.len()
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
