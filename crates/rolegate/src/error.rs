//! Error types for the query facade.

use std::time::Duration;

use rolegate_core::DomainError;
use rolegate_store::StoreError;
use thiserror::Error;

/// Errors that can occur during facade operations.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Storage error, domain outcomes included.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation ran past its deadline.
    #[error("{op} exceeded its deadline of {limit:?}")]
    DeadlineExceeded { op: &'static str, limit: Duration },
}

impl AuthzError {
    /// The domain error, if this is one.
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            AuthzError::Store(e) => e.domain(),
            AuthzError::DeadlineExceeded { .. } => None,
        }
    }

    /// True when the failure only says that a subject, role or assignment
    /// is absent.
    ///
    /// Decision operations turn these into a negative answer. Everything
    /// else is a genuine fault and propagates.
    pub fn is_absence(&self) -> bool {
        self.domain().is_some_and(DomainError::is_not_found)
    }
}

impl From<DomainError> for AuthzError {
    fn from(e: DomainError) -> Self {
        AuthzError::Store(StoreError::Domain(e))
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
