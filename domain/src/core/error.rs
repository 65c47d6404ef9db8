//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised at construction and lookup boundaries; the kernel never swallows
/// these except the narrow [`DomainError::UnknownTask`] path during task-plan
/// formation.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Unknown predicate: {0}")]
    UnknownPredicate(String),

    #[error("Precondition failed for '{action}': {reason}")]
    PreconditionFailed { action: String, reason: String },

    #[error("Serialization error in '{field}': {detail}")]
    Serialization { field: String, detail: String },
}

impl DomainError {
    /// Check if this error is the recoverable unknown-task case.
    pub fn is_unknown_task(&self) -> bool {
        matches!(self, DomainError::UnknownTask(_))
    }
}
