//! Error taxonomy shared by the catalog services.

use crate::clients::ProviderError;
use thiserror::Error;

/// Domain errors for catalog operations.
///
/// Nothing here is fatal to the process: every variant is recoverable by
/// retrying the same operation later.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Upstream fetch failed (network, 4xx other than "not found", 5xx).
    #[error("Metadata provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The primary store rejected a write.
    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),

    /// The primary store could not be read.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The request contradicts the stored record (e.g. wrong kind).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Trash cache error: {0}")]
    Trash(String),
}

impl CatalogError {
    pub(crate) fn write(err: impl std::fmt::Display) -> Self {
        Self::StoreWriteFailed(err.to_string())
    }

    pub(crate) fn read(err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(err.to_string())
    }

    /// Whether retrying the same call later can succeed without operator input.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_)
                | Self::StoreWriteFailed(_)
                | Self::StoreUnavailable(_)
                | Self::Trash(_)
        )
    }
}

impl From<ProviderError> for CatalogError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(what) => Self::NotFound(what),
            other => Self::ProviderUnavailable(other.to_string()),
        }
    }
}
