//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rolegate::{Authorizer, AuthorizerConfig, PolicyStore};
use rolegate_store::{MemoryStore, SqliteStore};
use rolegate_core::{Actor, Permission, Role};
use rolegate_rpc::{AuditEvent, AuditSink};

/// A facade over a fresh store.
pub struct PolicyFixture<S: PolicyStore = MemoryStore> {
    pub authz: Authorizer<S>,
}

impl PolicyFixture<MemoryStore> {
    /// Create a fixture over an empty in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for PolicyFixture<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyFixture<SqliteStore> {
    /// Create a fixture over an in-memory SQLite database.
    pub fn sqlite() -> rolegate::Result<Self> {
        Ok(Self::with_store(SqliteStore::open_memory()?))
    }

    /// Create a fixture over the SQLite database file at `path`.
    pub fn sqlite_file(path: impl AsRef<Path>) -> rolegate::Result<Self> {
        Ok(Self::with_store(SqliteStore::open(path)?))
    }
}

impl<S: PolicyStore> PolicyFixture<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            authz: Authorizer::new(store, AuthorizerConfig::default()),
        }
    }

    /// Create a role from `(name, resource)` pairs.
    pub async fn role(&self, name: &str, permissions: &[(&str, &str)]) -> rolegate::Result<Role> {
        let permissions: Vec<Permission> = permissions
            .iter()
            .map(|(n, r)| Permission::new(*n, *r))
            .collect();
        self.authz.create_role(name, &permissions).await
    }

    /// The `billing-admin` role granting `invoice.read` on `org:42`.
    pub async fn billing_admin(&self) -> rolegate::Result<Role> {
        self.role("billing-admin", &[("invoice.read", "org:42")]).await
    }

    /// Assign `role` to every actor given.
    pub async fn assign_all(&self, role: &str, actors: &[Actor]) -> rolegate::Result<()> {
        for actor in actors {
            self.authz.assign_role(role, actor).await?;
        }
        Ok(())
    }
}

/// An actor from the `uaa` issuer.
pub fn uaa(id: &str) -> Actor {
    Actor::new(id, "uaa")
}

/// Create `count` distinct actors for multi-actor tests.
pub fn actors(count: usize) -> Vec<Actor> {
    (0..count).map(|i| uaa(&format!("user-{i}"))).collect()
}

/// An audit sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AuditEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All events recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<AuditEvent> {
        self.lock().last().cloned()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_rpc::{Outcome, StatusCode};

    #[tokio::test]
    async fn test_fixture_seeds_policy() {
        let fixture = PolicyFixture::new();
        fixture.billing_admin().await.unwrap();
        fixture.assign_all("billing-admin", &actors(3)).await.unwrap();

        let holders = fixture.authz.list_role_actors("billing-admin").await.unwrap();
        assert_eq!(holders.len(), 3);
        assert!(fixture
            .authz
            .has_permission(&uaa("user-1"), "invoice.read", "org:42")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_fixture() {
        let fixture = PolicyFixture::sqlite().unwrap();
        fixture.billing_admin().await.unwrap();
        assert_eq!(fixture.authz.list_roles().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_file_fixture_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.db");

        let fixture = PolicyFixture::sqlite_file(&path).unwrap();
        fixture.billing_admin().await.unwrap();
        fixture.assign_all("billing-admin", &actors(2)).await.unwrap();
        drop(fixture);

        let reopened = PolicyFixture::sqlite_file(&path).unwrap();
        assert!(reopened
            .authz
            .has_role(&uaa("user-0"), "billing-admin")
            .await
            .unwrap());
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingAuditSink::new();
        assert!(sink.last().is_none());

        sink.record(&AuditEvent {
            signature: "GetRole",
            name: "get role",
            outcome: Outcome::Failure,
            code: StatusCode::NotFound,
            fields: vec![("role", "ghost-role".into())],
        });
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.last().map(|e| e.code), Some(StatusCode::NotFound));
    }
}
