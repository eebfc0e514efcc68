//! Error types for the store module.

use rolegate_core::DomainError;
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// `Domain` carries the expected policy outcomes (missing role, duplicate
/// assignment, empty field). Everything else is an opaque backing-store fault.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Policy-level failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Invalid store configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The caller's deadline ran out before the operation committed.
    /// Nothing was written.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Internal failure (poisoned lock, lost blocking task).
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// The domain error, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            _ => None,
        }
    }

    /// True for `NotFound` of any entity.
    pub fn is_not_found(&self) -> bool {
        self.domain().is_some_and(DomainError::is_not_found)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_core::{Entity, Field};

    #[test]
    fn test_domain_passthrough() {
        let err = StoreError::from(DomainError::NotFound(Entity::Role));
        assert_eq!(err.to_string(), "role not found");
        assert!(err.is_not_found());
        assert_eq!(err.domain(), Some(&DomainError::NotFound(Entity::Role)));
    }

    #[test]
    fn test_internal_is_opaque() {
        let err = StoreError::Internal("lock poisoned".into());
        assert!(!err.is_not_found());
        assert!(err.domain().is_none());

        let err = StoreError::from(DomainError::CannotBeEmpty(Field::Issuer));
        assert!(!err.is_not_found());
    }
}
