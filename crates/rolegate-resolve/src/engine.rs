//! Resolution algorithms.
//!
//! Pure functions of an [`ActorGrants`] read. Nothing here mutates state or
//! fails: a role named by an assignment but missing from the role table is
//! skipped, never reported.

use std::collections::BTreeSet;

use rolegate_core::{Permission, Role};
use rolegate_store::{ActorGrants, GrantedRole};

/// Iterate the assigned roles that still exist, with their permissions.
fn live_roles(grants: &ActorGrants) -> impl Iterator<Item = (&GrantedRole, &[Permission])> {
    grants
        .roles
        .iter()
        .filter_map(|role| role.permissions.as_deref().map(|p| (role, p)))
}

/// True iff some assigned role grants `permission_name` on exactly
/// `resource_id`.
pub fn has_permission(grants: &ActorGrants, permission_name: &str, resource_id: &str) -> bool {
    live_roles(grants)
        .flat_map(|(_, permissions)| permissions)
        .any(|p| p.grants(permission_name, resource_id))
}

/// True iff `role_name` is in the actor's assignment set.
pub fn has_role(grants: &ActorGrants, role_name: &str) -> bool {
    live_roles(grants).any(|(role, _)| role.name == role_name)
}

/// The roles currently assigned to the actor, sorted by name.
pub fn actor_roles(grants: &ActorGrants) -> Vec<Role> {
    live_roles(grants)
        .map(|(role, _)| Role::new(role.name.clone()))
        .collect()
}

/// Every distinct resource pattern the actor holds `permission_name` on.
pub fn resource_patterns(grants: &ActorGrants, permission_name: &str) -> BTreeSet<String> {
    live_roles(grants)
        .flat_map(|(_, permissions)| permissions)
        .filter(|p| p.name == permission_name)
        .map(|p| p.resource_pattern.clone())
        .collect()
}
