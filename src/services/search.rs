use crate::clients::{MetadataProvider, ProviderSearchHit};
use crate::constants::limits::MAX_SEARCH_RESULTS;
use crate::db::CatalogStore;
use crate::domain::{CatalogError, EntryId, EntryKind};
use crate::models::entry::Entry;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One row of the operator's pick list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: EntryId,
    pub kind: EntryKind,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub in_catalog: bool,
    pub admin_edited: bool,
}

impl From<&Entry> for Candidate {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.clone(),
            kind: entry.kind,
            title: entry.metadata.title.clone(),
            poster_url: entry.metadata.poster_url.clone(),
            release_date: entry.metadata.release_date.clone(),
            overview: entry.metadata.overview.clone(),
            in_catalog: true,
            admin_edited: entry.admin_edited(),
        }
    }
}

impl From<ProviderSearchHit> for Candidate {
    fn from(hit: ProviderSearchHit) -> Self {
        Self {
            id: hit.id,
            kind: hit.kind,
            title: hit.title,
            poster_url: hit.poster_url,
            release_date: hit.release_date,
            overview: hit.overview,
            in_catalog: false,
            admin_edited: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub kind: Option<EntryKind>,
    /// Skip the provider entirely and only list stored entries.
    pub in_catalog_only: bool,
}

impl CandidateFilter {
    fn accepts(self, kind: EntryKind) -> bool {
        self.kind.is_none_or(|k| k == kind)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub candidates: Vec<Candidate>,
    /// The provider could not be queried; only stored entries are listed.
    pub provider_degraded: bool,
}

/// Read-only merge of stored entries and provider hits.
pub struct SearchService {
    store: Arc<dyn CatalogStore>,
    provider: Arc<dyn MetadataProvider>,
}

impl SearchService {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self { store, provider }
    }

    /// Stored matches first, then provider hits not already stored.
    ///
    /// # Errors
    ///
    /// [`CatalogError::StoreUnavailable`] if the store can't be searched.
    /// Provider failures only set `provider_degraded`.
    pub async fn search(
        &self,
        query: &str,
        filter: CandidateFilter,
    ) -> Result<SearchResults, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResults::default());
        }

        let limit = MAX_SEARCH_RESULTS as u64;
        let (stored, upstream) = if filter.in_catalog_only {
            (self.store.search_entries(query, limit).await, None)
        } else {
            let (stored, upstream) = tokio::join!(
                self.store.search_entries(query, limit),
                self.provider.search(query)
            );
            (stored, Some(upstream))
        };

        let stored = stored.map_err(CatalogError::read)?;

        let mut seen: HashSet<(EntryKind, EntryId)> = HashSet::new();
        let mut candidates: Vec<Candidate> = Vec::new();

        for entry in stored.iter().filter(|e| filter.accepts(e.kind)) {
            if seen.insert((entry.kind, entry.id.clone())) {
                candidates.push(Candidate::from(entry));
            }
        }

        let mut provider_degraded = false;
        match upstream {
            Some(Ok(hits)) => {
                for hit in hits.into_iter().filter(|h| filter.accepts(h.kind)) {
                    if seen.insert((hit.kind, hit.id.clone())) {
                        candidates.push(Candidate::from(hit));
                    }
                }
            }
            Some(Err(e)) => {
                warn!(query, error = %e, "Provider search failed, showing catalog matches only");
                provider_degraded = true;
            }
            None => debug!(query, "Catalog-only search"),
        }

        candidates.truncate(MAX_SEARCH_RESULTS);
        info!(
            query,
            results = candidates.len(),
            provider_degraded,
            "Candidate search complete"
        );

        Ok(SearchResults {
            candidates,
            provider_degraded,
        })
    }
}
