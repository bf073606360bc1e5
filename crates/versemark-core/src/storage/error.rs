//! Storage error handling
//!
//! Every store operation returns a `StoreError` from a small taxonomy.
//! Nothing is retried internally; failures reach the caller as-is.

use thiserror::Error;

use crate::versification::VersificationError;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Update or delete addressed an id that does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Invalid range or invalid reference to another entity
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Conversion requested for a scheme that is not registered
    #[error("Unsupported versification scheme: '{0}'")]
    UnsupportedScheme(String),

    /// Failure reported by the storage engine, surfaced unchanged
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        StoreError::NotFound { entity, id }
    }

    pub(crate) fn constraint(message: impl Into<String>) -> Self {
        StoreError::Constraint(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint(_))
    }
}

impl From<VersificationError> for StoreError {
    fn from(error: VersificationError) -> Self {
        match error {
            VersificationError::UnsupportedScheme(name) => StoreError::UnsupportedScheme(name),
            other => StoreError::Constraint(other.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
