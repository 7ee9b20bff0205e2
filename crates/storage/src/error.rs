use thiserror::Error;

use charterops_core::RecordKind;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The backing store could not be reached or the operation failed transiently.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        StoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
