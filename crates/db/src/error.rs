//! Storage error types.

use sea_orm::DbErr;
use tally_core::allocation::AllocationError;
use tally_core::posting::PostingError;
use tally_shared::error::AppError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the repositories.
///
/// Engine errors ([`PostingError`], [`AllocationError`]) pass through with
/// their own codes; the variants here cover what only storage can know.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity kind (e.g. "transaction").
        entity: &'static str,
        /// The unresolved id.
        id: Uuid,
    },

    /// A reference number is already taken for this company and type.
    #[error("Reference '{reference}' already exists for this transaction type")]
    DuplicateReference {
        /// The conflicting reference.
        reference: String,
    },

    /// The row's lifecycle is owned by another transaction.
    #[error("Dependency violation: {0}")]
    Dependency(String),

    /// Posting-engine failure (validation or configuration).
    #[error(transparent)]
    Posting(#[from] PostingError),

    /// Allocation-plan failure (over-application or validation).
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// A stored value could not be interpreted.
    #[error("Corrupted row: {0}")]
    Corrupted(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StoreError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateReference { .. } => "CONFLICT",
            Self::Dependency(_) => "DEPENDENCY_VIOLATION",
            Self::Posting(err) => err.error_code(),
            Self::Allocation(err) => err.error_code(),
            Self::Corrupted(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::DuplicateReference { .. } => Self::Conflict(err.to_string()),
            StoreError::Dependency(message) => Self::Dependency(message),
            StoreError::Posting(inner) => inner.into(),
            StoreError::Allocation(inner) => inner.into(),
            StoreError::Corrupted(message) => Self::Internal(message),
            StoreError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}
