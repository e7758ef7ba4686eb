//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every engine error maps into one of these categories. None of them is
/// retried automatically; each carries enough detail (ids, amounts, limits)
/// for the caller to correct the input.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation (unbalanced postings, missing association).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An allocation exceeds the remaining capacity of its target.
    #[error("Over-application: {0}")]
    OverApplication(String),

    /// Attempt to delete a row whose lifecycle is owned elsewhere.
    #[error("Dependency violation: {0}")]
    Dependency(String),

    /// A required chart-of-accounts entry or tax setup is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Conflict (e.g., duplicate reference number).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::OverApplication(_) => "OVER_APPLICATION",
            Self::Dependency(_) => "DEPENDENCY_VIOLATION",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller can fix this error by correcting input.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }
}
