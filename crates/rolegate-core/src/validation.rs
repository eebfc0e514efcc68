//! Input validation: reject empty identifiers before they reach a store.

use crate::error::{DomainError, Field};
use crate::types::{Actor, Permission};

/// Check that a field carries a value.
pub fn require(value: &str, field: Field) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::CannotBeEmpty(field));
    }
    Ok(())
}

pub fn validate_role_name(name: &str) -> Result<(), DomainError> {
    require(name, Field::RoleName)
}

/// Validate an actor identity.
///
/// The domain id is checked first, so an actor with both fields empty
/// reports `domain id`.
pub fn validate_actor(actor: &Actor) -> Result<(), DomainError> {
    require(&actor.domain_id, Field::DomainId)?;
    require(&actor.issuer, Field::Issuer)
}

pub fn validate_permission(permission: &Permission) -> Result<(), DomainError> {
    require(&permission.name, Field::PermissionName)?;
    require(&permission.resource_pattern, Field::ResourcePattern)
}

/// Validate the inputs of a role creation.
pub fn validate_new_role(name: &str, permissions: &[Permission]) -> Result<(), DomainError> {
    validate_role_name(name)?;
    permissions.iter().try_for_each(validate_permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_actor() {
        assert!(validate_actor(&Actor::new("u1", "uaa")).is_ok());
    }

    #[test]
    fn test_empty_domain_id() {
        let result = validate_actor(&Actor::new("", "uaa"));
        assert_eq!(result, Err(DomainError::CannotBeEmpty(Field::DomainId)));
    }

    #[test]
    fn test_empty_issuer() {
        let result = validate_actor(&Actor::new("u1", ""));
        assert_eq!(result, Err(DomainError::CannotBeEmpty(Field::Issuer)));
    }

    #[test]
    fn test_both_empty_reports_domain_id() {
        let result = validate_actor(&Actor::new("", ""));
        assert_eq!(result, Err(DomainError::CannotBeEmpty(Field::DomainId)));
    }

    #[test]
    fn test_new_role_without_permissions() {
        assert!(validate_new_role("auditor", &[]).is_ok());
    }

    #[test]
    fn test_new_role_empty_name() {
        let result = validate_new_role("", &[]);
        assert_eq!(result, Err(DomainError::CannotBeEmpty(Field::RoleName)));
    }

    #[test]
    fn test_new_role_bad_permission() {
        let permissions = vec![
            Permission::new("invoice.read", "org:42"),
            Permission::new("invoice.write", ""),
        ];
        let result = validate_new_role("billing-admin", &permissions);
        assert_eq!(
            result,
            Err(DomainError::CannotBeEmpty(Field::ResourcePattern))
        );

        let result = validate_new_role("billing-admin", &[Permission::new("", "org:42")]);
        assert_eq!(
            result,
            Err(DomainError::CannotBeEmpty(Field::PermissionName))
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn non_empty_actor_is_valid(id in ".+", issuer in ".+") {
                prop_assert!(validate_actor(&Actor::new(id, issuer)).is_ok());
            }

            #[test]
            fn validity_is_non_emptiness(name in ".{0,4}", res in ".{0,4}") {
                let result = validate_permission(&Permission::new(name.clone(), res.clone()));
                prop_assert_eq!(result.is_ok(), !name.is_empty() && !res.is_empty());
            }
        }
    }
}
