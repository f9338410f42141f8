use thiserror::Error;

pub type Result<T> = std::result::Result<T, TipsterError>;

#[derive(Error, Debug)]
pub enum TipsterError {
    /// Malformed prediction rejected at write time; nothing persisted.
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation referenced a match key with no stored prediction.
    #[error("no prediction stored for match key {0}")]
    NotFound(String),

    /// Conflicting re-resolution of a final result without the override flag.
    #[error("match {match_key} already resolved as {existing}, refusing {proposed} without override")]
    AlreadyResolved {
        match_key: String,
        existing: String,
        proposed: String,
    },

    /// Results source unreachable or returned unusable data for the round.
    #[error("results provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("ledger storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl TipsterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TipsterError::NotFound(_))
    }

    pub fn is_provider_unavailable(&self) -> bool {
        matches!(self, TipsterError::ProviderUnavailable(_))
    }

    pub fn is_already_resolved(&self) -> bool {
        matches!(self, TipsterError::AlreadyResolved { .. })
    }
}
