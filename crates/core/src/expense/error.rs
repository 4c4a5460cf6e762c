//! Expense lifecycle error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using `ExpenseError`.
pub type ExpenseResult<T> = Result<T, ExpenseError>;

/// Errors that can occur during expense operations.
///
/// All failures are local and final; no operation retries internally.
#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Unknown expense id.
    #[error("Expense {0} not found")]
    NotFound(Uuid),

    /// Malformed or missing required input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation illegal in the record's current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller lacks the required role or ownership/account access.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Store persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Collaborator lookup failure (chart of accounts).
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl ExpenseError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Forbidden(_) => 403,
            Self::Storage(_) => 500,
            Self::Upstream(_) => 502,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}
