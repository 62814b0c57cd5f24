use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The submitted batch is not a well-formed sequence of field mappings.
    /// `index` points at the offending record when there is one.
    #[error("Malformed batch: {reason}")]
    MalformedBatch {
        index: Option<usize>,
        reason: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn malformed(index: Option<usize>, reason: impl Into<String>) -> Self {
        Self::MalformedBatch {
            index,
            reason: reason.into(),
        }
    }
}
