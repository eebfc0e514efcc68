//! Store-backed resolution.
//!
//! A [`Resolver`] takes one [`ActorGrants`] read from the store and answers
//! from it, so each decision sees a single consistent state. An actor the
//! store has never recorded resolves like an actor holding nothing.
//!
//! [`ActorGrants`]: rolegate_store::ActorGrants

use std::collections::BTreeSet;

use rolegate_core::{Actor, Role};
use rolegate_store::{PolicyStore, Result};

use crate::engine;

/// Read-only resolution over a policy store.
pub struct Resolver<'a, S: PolicyStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: PolicyStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Whether the actor holds `permission_name` on exactly `resource_id`.
    pub async fn has_permission(
        &self,
        actor: &Actor,
        permission_name: &str,
        resource_id: &str,
    ) -> Result<bool> {
        Ok(self
            .store
            .actor_grants(actor)
            .await?
            .is_some_and(|g| engine::has_permission(&g, permission_name, resource_id)))
    }

    /// Whether the actor is assigned `role_name`.
    pub async fn has_role(&self, actor: &Actor, role_name: &str) -> Result<bool> {
        Ok(self
            .store
            .actor_grants(actor)
            .await?
            .is_some_and(|g| engine::has_role(&g, role_name)))
    }

    /// The roles assigned to the actor.
    pub async fn actor_roles(&self, actor: &Actor) -> Result<Vec<Role>> {
        Ok(self
            .store
            .actor_grants(actor)
            .await?
            .map(|g| engine::actor_roles(&g))
            .unwrap_or_default())
    }

    /// Distinct resource patterns the actor holds `permission_name` on.
    pub async fn resource_patterns(
        &self,
        actor: &Actor,
        permission_name: &str,
    ) -> Result<BTreeSet<String>> {
        Ok(self
            .store
            .actor_grants(actor)
            .await?
            .map(|g| engine::resource_patterns(&g, permission_name))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_core::Permission;
    use rolegate_store::MemoryStore;

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_role("billing-admin", &[Permission::new("invoice.read", "org:42")])
            .await
            .unwrap();
        store
            .create_role("auditor", &[Permission::new("invoice.read", "org:42")])
            .await
            .unwrap();
        store
            .assign_role("billing-admin", &Actor::new("u1", "uaa"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_resolves_through_store() {
        let store = seeded().await;
        let resolver = Resolver::new(&store);
        let u1 = Actor::new("u1", "uaa");

        assert!(resolver.has_permission(&u1, "invoice.read", "org:42").await.unwrap());
        assert!(!resolver.has_permission(&u1, "invoice.read", "org:99").await.unwrap());
        assert!(resolver.has_role(&u1, "billing-admin").await.unwrap());
        assert!(!resolver.has_role(&u1, "auditor").await.unwrap());
        assert_eq!(
            resolver.actor_roles(&u1).await.unwrap(),
            vec![Role::new("billing-admin")]
        );
    }

    #[tokio::test]
    async fn test_unknown_actor_resolves_empty() {
        let store = seeded().await;
        let resolver = Resolver::new(&store);
        let stranger = Actor::new("u9", "uaa");

        assert!(!resolver.has_permission(&stranger, "invoice.read", "org:42").await.unwrap());
        assert!(!resolver.has_role(&stranger, "billing-admin").await.unwrap());
        assert!(resolver.actor_roles(&stranger).await.unwrap().is_empty());
        assert!(resolver
            .resource_patterns(&stranger, "invoice.read")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_patterns_dedup_across_roles() {
        let store = seeded().await;
        let u1 = Actor::new("u1", "uaa");
        store.assign_role("auditor", &u1).await.unwrap();

        let patterns = Resolver::new(&store)
            .resource_patterns(&u1, "invoice.read")
            .await
            .unwrap();
        assert_eq!(patterns.len(), 1);
        assert!(patterns.contains("org:42"));
    }
}
