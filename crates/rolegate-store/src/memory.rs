//! In-memory implementation of the PolicyStore trait.
//!
//! This is the reference store. It keeps every table behind one `RwLock`, so
//! reads run concurrently with each other and every write (the cascading
//! delete included) is a single exclusive section.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use rolegate_core::{
    validate_actor, validate_new_role, validate_role_name, Actor, DomainError, Entity,
    Permission, Role,
};

use crate::error::{Result, StoreError};
use crate::traits::{ActorGrants, GrantedRole, PolicyStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Roles indexed by name.
    roles: HashMap<String, Role>,

    /// Permission lists indexed by owning role name.
    permissions: HashMap<String, Vec<Permission>>,

    /// Assignment sets. Presence of a key is the actor's record.
    assignments: HashMap<Actor, BTreeSet<String>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Internal(format!("policy lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Internal(format!("policy lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn require_role(&self, name: &str) -> Result<&Role> {
        self.roles
            .get(name)
            .ok_or(StoreError::Domain(DomainError::NotFound(Entity::Role)))
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn create_role(&self, name: &str, permissions: &[Permission]) -> Result<Role> {
        validate_new_role(name, permissions)?;
        let mut inner = self.write()?;

        if inner.roles.contains_key(name) {
            return Err(DomainError::AlreadyExists(Entity::Role).into());
        }

        let role = Role::new(name);
        inner.roles.insert(name.to_string(), role.clone());
        inner
            .permissions
            .insert(name.to_string(), permissions.to_vec());

        Ok(role)
    }

    async fn find_role(&self, name: &str) -> Result<Role> {
        let inner = self.read()?;
        inner.require_role(name).cloned()
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        let mut inner = self.write()?;

        // Fail fast before touching anything
        inner.require_role(name)?;

        inner.permissions.remove(name);

        let mut revoked = 0usize;
        for roles in inner.assignments.values_mut() {
            if roles.remove(name) {
                revoked += 1;
            }
        }

        inner.roles.remove(name);

        tracing::debug!(role = name, revoked, "role deleted");
        Ok(())
    }

    async fn list_role_permissions(&self, name: &str) -> Result<Vec<Permission>> {
        let inner = self.read()?;
        inner.require_role(name)?;
        Ok(inner.permissions.get(name).cloned().unwrap_or_default())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let inner = self.read()?;
        let mut roles: Vec<Role> = inner.roles.values().cloned().collect();
        roles.sort();
        Ok(roles)
    }

    async fn create_actor(&self, actor: &Actor) -> Result<Actor> {
        validate_actor(actor)?;
        let mut inner = self.write()?;

        if inner.assignments.contains_key(actor) {
            return Err(DomainError::AlreadyExists(Entity::Actor).into());
        }

        inner.assignments.insert(actor.clone(), BTreeSet::new());
        Ok(actor.clone())
    }

    async fn find_actor(&self, actor: &Actor) -> Result<Actor> {
        let inner = self.read()?;
        inner
            .assignments
            .get_key_value(actor)
            .map(|(a, _)| a.clone())
            .ok_or(DomainError::NotFound(Entity::Actor).into())
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        let inner = self.read()?;
        let mut actors: Vec<Actor> = inner.assignments.keys().cloned().collect();
        actors.sort();
        Ok(actors)
    }

    async fn assign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        validate_role_name(role_name)?;
        validate_actor(actor)?;
        let mut inner = self.write()?;

        inner.require_role(role_name)?;

        let roles = inner.assignments.entry(actor.clone()).or_default();
        if !roles.insert(role_name.to_string()) {
            return Err(DomainError::AlreadyExists(Entity::Assignment).into());
        }

        Ok(())
    }

    async fn unassign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        validate_role_name(role_name)?;
        validate_actor(actor)?;
        let mut inner = self.write()?;

        inner.require_role(role_name)?;

        let roles = inner
            .assignments
            .get_mut(actor)
            .ok_or(StoreError::Domain(DomainError::NotFound(Entity::Actor)))?;

        if !roles.remove(role_name) {
            return Err(DomainError::NotFound(Entity::Assignment).into());
        }

        Ok(())
    }

    async fn list_role_actors(&self, role_name: &str) -> Result<Vec<Actor>> {
        let inner = self.read()?;
        inner.require_role(role_name)?;

        let mut actors: Vec<Actor> = inner
            .assignments
            .iter()
            .filter(|(_, roles)| roles.contains(role_name))
            .map(|(actor, _)| actor.clone())
            .collect();
        actors.sort();
        Ok(actors)
    }

    async fn actor_grants(&self, actor: &Actor) -> Result<Option<ActorGrants>> {
        let inner = self.read()?;

        let Some(role_names) = inner.assignments.get(actor) else {
            return Ok(None);
        };

        // BTreeSet iteration keeps the roles sorted by name
        let roles = role_names
            .iter()
            .map(|name| GrantedRole {
                name: name.clone(),
                permissions: inner
                    .roles
                    .contains_key(name)
                    .then(|| inner.permissions.get(name).cloned().unwrap_or_default()),
            })
            .collect();

        Ok(Some(ActorGrants {
            actor: actor.clone(),
            roles,
        }))
    }
}
