use thiserror::Error;

use crate::ContentId;

/// Failure reported by the archive store. Surfaced to the requester, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{0}")]
    Failed(String),
    #[error("{0} is not being archived")]
    NotFound(ContentId),
}

impl StoreError {
    pub fn failed(message: impl Into<String>) -> Self {
        StoreError::Failed(message.into())
    }
}
