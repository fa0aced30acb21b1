//! # Catalog Error Types Module
//!
//! Error taxonomy shared by the catalog store, the rating aggregator and the
//! conversation engine. Validation and not-found conditions are recoverable
//! and handled close to the user by re-prompting; store failures bubble up one
//! level and are reported as a generic "try again".

use thiserror::Error;

/// Why a piece of free-text input was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Input was empty or whitespace-only
    #[error("input is empty")]
    Empty,
    /// Input exceeds the allowed number of characters
    #[error("input is longer than {max} characters")]
    TooLong { max: usize },
}

/// Errors returned by catalog operations
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Referenced category or recipe no longer exists
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    /// Free-text input failed validation
    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
    /// Concurrent write kept winning the unique constraint race
    #[error("conflict: {0}")]
    Conflict(String),
    /// Underlying persistence failure
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl CatalogError {
    pub fn category_not_found(id: i64) -> Self {
        CatalogError::NotFound {
            entity: "category",
            id,
        }
    }

    pub fn recipe_not_found(id: i64) -> Self {
        CatalogError::NotFound {
            entity: "recipe",
            id,
        }
    }

    /// Whether the user can recover by being re-prompted with fresh data
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CatalogError::StoreUnavailable(_))
    }
}

/// Result alias used by the catalog APIs
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// True when a database error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// True when a database error is a FOREIGN KEY constraint violation
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = CatalogError::recipe_not_found(42);
        assert_eq!(format!("{}", err), "recipe 42 not found");

        let err = CatalogError::from(ValidationError::TooLong { max: 255 });
        assert_eq!(
            format!("{}", err),
            "validation failed: input is longer than 255 characters"
        );
    }

    #[test]
    fn test_store_errors_are_not_recoverable() {
        assert!(CatalogError::category_not_found(1).is_recoverable());
        assert!(CatalogError::Conflict("name".to_string()).is_recoverable());
        assert!(!CatalogError::StoreUnavailable(sqlx::Error::PoolTimedOut).is_recoverable());
    }
}
