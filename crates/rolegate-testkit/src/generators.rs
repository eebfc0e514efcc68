//! Proptest generators for property-based testing.

use proptest::prelude::*;

use rolegate::{Authorizer, PolicyStore};
use rolegate_core::{Actor, Permission};

/// Generate an issuer from a small fixed set, so actors collide on it.
pub fn issuer() -> impl Strategy<Value = String> {
    prop_oneof![Just("uaa"), Just("ldap"), Just("github")].prop_map(String::from)
}

/// Generate a non-empty actor.
pub fn actor() -> impl Strategy<Value = Actor> {
    ("[a-z][a-z0-9]{0,7}", issuer()).prop_map(|(id, issuer)| Actor::new(id, issuer))
}

/// Generate a role name.
pub fn role_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

/// Generate an action name such as `invoice.read`.
pub fn permission_name() -> impl Strategy<Value = String> {
    ("[a-z]{1,8}", prop_oneof![Just("read"), Just("write"), Just("delete")])
        .prop_map(|(noun, verb)| format!("{noun}.{verb}"))
}

/// Generate a resource identifier such as `org:42`.
pub fn resource() -> impl Strategy<Value = String> {
    (0u16..64).prop_map(|n| format!("org:{n}"))
}

/// Generate a permission.
pub fn permission() -> impl Strategy<Value = Permission> {
    (permission_name(), resource()).prop_map(|(name, res)| Permission::new(name, res))
}

/// A randomly generated policy: roles with permissions and assignments
/// referring to them by index.
#[derive(Debug, Clone)]
pub struct PolicyParams {
    pub roles: Vec<(String, Vec<Permission>)>,
    pub actors: Vec<Actor>,
    /// `(role index, actor index)` pairs, possibly repeated.
    pub assignments: Vec<(usize, usize)>,
}

impl Arbitrary for PolicyParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::collection::btree_map(role_name(), prop::collection::vec(permission(), 0..4), 1..6),
            prop::collection::btree_set(actor(), 1..6),
        )
            .prop_flat_map(|(roles, actors)| {
                let roles: Vec<_> = roles.into_iter().collect();
                let actors: Vec<_> = actors.into_iter().collect();
                let edges = prop::collection::vec((0..roles.len(), 0..actors.len()), 0..12);
                (Just(roles), Just(actors), edges)
            })
            .prop_map(|(roles, actors, assignments)| PolicyParams {
                roles,
                actors,
                assignments,
            })
            .boxed()
    }
}

impl PolicyParams {
    /// Load this policy through the facade.
    ///
    /// Repeated assignments are expected to fail and are skipped.
    pub async fn apply<S: PolicyStore>(&self, authz: &Authorizer<S>) -> rolegate::Result<()> {
        for (name, permissions) in &self.roles {
            authz.create_role(name, permissions).await?;
        }
        for &(role, actor) in &self.assignments {
            match authz
                .assign_role(&self.roles[role].0, &self.actors[actor])
                .await
            {
                Ok(()) => {}
                Err(e) if e.domain().is_some_and(|d| !d.is_not_found()) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Actors assigned the role at `role`.
    pub fn holders(&self, role: usize) -> Vec<&Actor> {
        let mut seen: Vec<usize> = self
            .assignments
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, a)| *a)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.into_iter().map(|a| &self.actors[a]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_core::{validate_actor, validate_permission, validate_role_name};

    proptest! {
        #[test]
        fn test_generated_values_are_valid(a in actor(), r in role_name(), p in permission()) {
            prop_assert!(validate_actor(&a).is_ok());
            prop_assert!(validate_role_name(&r).is_ok());
            prop_assert!(validate_permission(&p).is_ok());
        }

        #[test]
        fn test_policy_indices_in_range(params in any::<PolicyParams>()) {
            for (role, actor) in &params.assignments {
                prop_assert!(*role < params.roles.len());
                prop_assert!(*actor < params.actors.len());
            }
        }
    }
}
