pub mod catalog;
pub use catalog::{CatalogService, SavedEntry};

pub mod rate_limit;
pub use rate_limit::RateLimiter;

pub mod reconcile;
pub use reconcile::{
    AutoRefreshOutcome, CandidateResolution, ReconcileService, RefreshPolicy, SaveOutcome,
    SaveRequest, SeasonBackfill,
};

pub mod search;
pub use search::{Candidate, CandidateFilter, SearchResults, SearchService};

pub mod session;
pub use session::{EntryDraft, SessionContext};

pub mod sync;
pub use sync::{ProgressFn, SyncOrchestrator, SyncProgress, SyncReport};

pub mod trash;
pub use trash::{RestoreOutcome, TrashService};
