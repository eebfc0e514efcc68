//! Transport status codes and the mapping from facade errors.

use serde::{Deserialize, Serialize};

use rolegate::AuthzError;
use rolegate_core::DomainError;

/// Status codes carried by every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum StatusCode {
    Ok = 0,
    /// Generic failure. Only produced by [`StatusMapping::Collapsed`].
    Unknown = 1,
    NotFound = 2,
    AlreadyExists = 3,
    InvalidArgument = 4,
    DeadlineExceeded = 5,
    Internal = 6,
}

/// Outcome of a call as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::Ok, "")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }
}

/// How facade errors turn into statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMapping {
    /// One status code per domain error kind.
    #[default]
    Typed,
    /// Every domain error becomes [`StatusCode::Unknown`] carrying the error
    /// text, so callers cannot tell `NotFound` from `AlreadyExists`.
    Collapsed,
}

impl StatusMapping {
    /// Translate a facade error into the status returned to the caller.
    ///
    /// Backing store faults are reported as `Internal` without their detail.
    pub fn status_for(&self, err: &AuthzError) -> Status {
        if let AuthzError::DeadlineExceeded { .. } = err {
            return Status::new(StatusCode::DeadlineExceeded, err.to_string());
        }

        let Some(domain) = err.domain() else {
            tracing::error!(error = %err, "policy store fault");
            return Status::internal("internal error");
        };

        let code = match (self, domain) {
            (StatusMapping::Collapsed, _) => StatusCode::Unknown,
            (StatusMapping::Typed, DomainError::NotFound(_)) => StatusCode::NotFound,
            (StatusMapping::Typed, DomainError::AlreadyExists(_)) => StatusCode::AlreadyExists,
            (StatusMapping::Typed, DomainError::CannotBeEmpty(_)) => StatusCode::InvalidArgument,
        };
        Status::new(code, domain.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rolegate_core::{Entity, Field};
    use rolegate::store::StoreError;

    #[test]
    fn test_typed_mapping() {
        let typed = StatusMapping::Typed;

        let status = typed.status_for(&DomainError::NotFound(Entity::Role).into());
        assert_eq!(status, Status::new(StatusCode::NotFound, "role not found"));

        let status = typed.status_for(&DomainError::AlreadyExists(Entity::Assignment).into());
        assert_eq!(status.code, StatusCode::AlreadyExists);

        let status = typed.status_for(&DomainError::CannotBeEmpty(Field::Issuer).into());
        assert_eq!(status.code, StatusCode::InvalidArgument);
    }

    #[test]
    fn test_collapsed_mapping_keeps_message() {
        let collapsed = StatusMapping::Collapsed;

        let not_found = collapsed.status_for(&DomainError::NotFound(Entity::Role).into());
        let exists = collapsed.status_for(&DomainError::AlreadyExists(Entity::Role).into());
        assert_eq!(not_found.code, StatusCode::Unknown);
        assert_eq!(exists.code, StatusCode::Unknown);
        assert_eq!(not_found.message, "role not found");
    }

    #[test]
    fn test_faults_hide_detail() {
        for mapping in [StatusMapping::Typed, StatusMapping::Collapsed] {
            let err = AuthzError::from(StoreError::Internal("lock poisoned".into()));
            let status = mapping.status_for(&err);
            assert_eq!(status, Status::internal("internal error"));
        }
    }

    #[test]
    fn test_deadline() {
        let err = AuthzError::DeadlineExceeded {
            op: "has_role",
            limit: Duration::from_millis(5),
        };
        let status = StatusMapping::Collapsed.status_for(&err);
        assert_eq!(status.code, StatusCode::DeadlineExceeded);
    }
}
