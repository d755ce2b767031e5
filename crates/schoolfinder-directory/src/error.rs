use schoolfinder_core::{CriterionField, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("fetch failed: {0}")]
    Source(#[from] SourceError),

    #[error("{0} is not a multi-value criterion")]
    NotToggleable(CriterionField),
}

impl DirectoryError {
    /// Whether repeating the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_retryable(),
            Self::NotToggleable(_) => false,
        }
    }
}
