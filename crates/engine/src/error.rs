use thiserror::Error;

use procur_core::DomainError;

use crate::store::StoreError;

/// Anything a lifecycle operation can fail with.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether retrying the same call can succeed (lost an optimistic
    /// concurrency race).
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::Store(StoreError::Concurrency(_))
                | EngineError::Domain(DomainError::Conflict(_))
        )
    }
}
