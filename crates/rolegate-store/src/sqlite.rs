//! SQLite implementation of the PolicyStore trait.
//!
//! This is the persistent backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking. Every operation that touches
//! more than one row runs inside one transaction, so a cascading delete is
//! never observable half-done.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use rolegate_core::{
    validate_actor, validate_new_role, validate_role_name, Actor, DomainError, Entity,
    Permission, Role,
};

use crate::deadline::CallDeadline;
use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{ActorGrants, GrantedRole, PolicyStore};

/// How long a writer waits on a database locked by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    ///
    /// The caller's [`CallDeadline`], if any, travels with the closure: work
    /// that is still queued when it expires never runs, lock waits are capped
    /// at the remaining budget, and [`Gate::commit`] refuses to commit late.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection, &Gate) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let gate = Gate(CallDeadline::current());

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Internal(format!("mutex poisoned: {}", e)))?;
            gate.check()?;
            conn.busy_timeout(gate.busy_timeout())?;

            match f(&mut conn, &gate) {
                Err(StoreError::Database(e)) if gate.expired() => {
                    tracing::debug!(error = %e, "sqlite call ran out of time");
                    Err(StoreError::DeadlineExceeded)
                }
                result => result,
            }
        })
        .await
        .map_err(|e| StoreError::Internal(format!("spawn_blocking failed: {}", e)))?
    }
}

/// The caller's deadline as seen from the worker thread.
struct Gate(Option<Arc<CallDeadline>>);

impl Gate {
    fn expired(&self) -> bool {
        self.0.as_ref().is_some_and(|d| d.is_expired())
    }

    fn check(&self) -> Result<()> {
        if self.expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(())
    }

    fn busy_timeout(&self) -> Duration {
        self.0
            .as_ref()
            .map_or(BUSY_TIMEOUT, |d| d.remaining().min(BUSY_TIMEOUT))
    }

    /// Commit unless the caller has given up. Dropping `tx` rolls back.
    fn commit(&self, tx: Transaction<'_>) -> Result<()> {
        if let Some(deadline) = &self.0 {
            if !deadline.begin_commit() {
                return Err(StoreError::DeadlineExceeded);
            }
        }
        tx.commit()?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row helpers (usable on a Connection or a Transaction)
// ─────────────────────────────────────────────────────────────────────────────

fn role_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM roles WHERE name = ?1", params![name], |_| {
            Ok(())
        })
        .optional()?;
    Ok(found.is_some())
}

fn require_role(conn: &Connection, name: &str) -> Result<()> {
    if role_exists(conn, name)? {
        Ok(())
    } else {
        Err(DomainError::NotFound(Entity::Role).into())
    }
}

fn actor_exists(conn: &Connection, actor: &Actor) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM actors WHERE domain_id = ?1 AND issuer = ?2",
            params![actor.domain_id, actor.issuer],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn insert_actor(conn: &Connection, actor: &Actor) -> Result<()> {
    conn.execute(
        "INSERT INTO actors (domain_id, issuer, created_at) VALUES (?1, ?2, ?3)",
        params![actor.domain_id, actor.issuer, now_millis()],
    )
    .map_err(|e| unique_violation(e, Entity::Actor))?;
    Ok(())
}

fn load_permissions(conn: &Connection, role_name: &str) -> Result<Vec<Permission>> {
    let mut stmt = conn.prepare(
        "SELECT name, resource_pattern FROM permissions WHERE role_name = ?1 ORDER BY id",
    )?;

    let permissions = stmt
        .query_map(params![role_name], |row| {
            Ok(Permission {
                name: row.get(0)?,
                resource_pattern: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(permissions)
}

fn row_to_actor(row: &rusqlite::Row<'_>) -> rusqlite::Result<Actor> {
    Ok(Actor {
        domain_id: row.get("domain_id")?,
        issuer: row.get("issuer")?,
    })
}

/// Map a uniqueness violation raced in by another connection onto the
/// domain error the explicit checks would have produced.
fn unique_violation(err: rusqlite::Error, entity: Entity) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            DomainError::AlreadyExists(entity).into()
        }
        _ => err.into(),
    }
}

#[async_trait]
impl PolicyStore for SqliteStore {
    async fn create_role(&self, name: &str, permissions: &[Permission]) -> Result<Role> {
        validate_new_role(name, permissions)?;
        let name = name.to_string();
        let permissions = permissions.to_vec();

        self.blocking(move |conn, gate| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if role_exists(&tx, &name)? {
                return Err(DomainError::AlreadyExists(Entity::Role).into());
            }

            tx.execute(
                "INSERT INTO roles (name, created_at) VALUES (?1, ?2)",
                params![name, now_millis()],
            )
            .map_err(|e| unique_violation(e, Entity::Role))?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO permissions (role_name, name, resource_pattern)
                     VALUES (?1, ?2, ?3)",
                )?;
                for permission in &permissions {
                    stmt.execute(params![name, permission.name, permission.resource_pattern])?;
                }
            }

            gate.commit(tx)?;
            Ok(Role::new(name))
        })
        .await
    }

    async fn find_role(&self, name: &str) -> Result<Role> {
        let name = name.to_string();

        self.blocking(move |conn, _| {
            conn.query_row(
                "SELECT name FROM roles WHERE name = ?1",
                params![name],
                |row| Ok(Role::new(row.get::<_, String>(0)?)),
            )
            .optional()?
            .ok_or(DomainError::NotFound(Entity::Role).into())
        })
        .await
    }

    async fn delete_role(&self, name: &str) -> Result<()> {
        let name = name.to_string();

        self.blocking(move |conn, gate| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // Fail fast before touching anything
            require_role(&tx, &name)?;

            tx.execute("DELETE FROM permissions WHERE role_name = ?1", params![name])?;
            let revoked = tx.execute(
                "DELETE FROM role_assignments WHERE role_name = ?1",
                params![name],
            )?;
            tx.execute("DELETE FROM roles WHERE name = ?1", params![name])?;

            gate.commit(tx)?;
            tracing::debug!(role = %name, revoked, "role deleted");
            Ok(())
        })
        .await
    }

    async fn list_role_permissions(&self, name: &str) -> Result<Vec<Permission>> {
        let name = name.to_string();

        self.blocking(move |conn, _| {
            let tx = conn.transaction()?;
            require_role(&tx, &name)?;
            let permissions = load_permissions(&tx, &name)?;
            tx.commit()?;
            Ok(permissions)
        })
        .await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.blocking(|conn, _| {
            let mut stmt = conn.prepare("SELECT name FROM roles ORDER BY name")?;
            let roles = stmt
                .query_map([], |row| Ok(Role::new(row.get::<_, String>(0)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(roles)
        })
        .await
    }

    async fn create_actor(&self, actor: &Actor) -> Result<Actor> {
        validate_actor(actor)?;
        let actor = actor.clone();

        self.blocking(move |conn, gate| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if actor_exists(&tx, &actor)? {
                return Err(DomainError::AlreadyExists(Entity::Actor).into());
            }
            insert_actor(&tx, &actor)?;

            gate.commit(tx)?;
            Ok(actor)
        })
        .await
    }

    async fn find_actor(&self, actor: &Actor) -> Result<Actor> {
        let actor = actor.clone();

        self.blocking(move |conn, _| {
            conn.query_row(
                "SELECT domain_id, issuer FROM actors WHERE domain_id = ?1 AND issuer = ?2",
                params![actor.domain_id, actor.issuer],
                row_to_actor,
            )
            .optional()?
            .ok_or(DomainError::NotFound(Entity::Actor).into())
        })
        .await
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        self.blocking(|conn, _| {
            let mut stmt =
                conn.prepare("SELECT domain_id, issuer FROM actors ORDER BY domain_id, issuer")?;
            let actors = stmt
                .query_map([], row_to_actor)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(actors)
        })
        .await
    }

    async fn assign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        validate_role_name(role_name)?;
        validate_actor(actor)?;
        let role_name = role_name.to_string();
        let actor = actor.clone();

        self.blocking(move |conn, gate| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            require_role(&tx, &role_name)?;

            if !actor_exists(&tx, &actor)? {
                insert_actor(&tx, &actor)?;
            }

            let assigned = tx
                .query_row(
                    "SELECT 1 FROM role_assignments
                     WHERE domain_id = ?1 AND issuer = ?2 AND role_name = ?3",
                    params![actor.domain_id, actor.issuer, role_name],
                    |_| Ok(()),
                )
                .optional()?;
            if assigned.is_some() {
                return Err(DomainError::AlreadyExists(Entity::Assignment).into());
            }

            tx.execute(
                "INSERT INTO role_assignments (domain_id, issuer, role_name, assigned_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![actor.domain_id, actor.issuer, role_name, now_millis()],
            )
            .map_err(|e| unique_violation(e, Entity::Assignment))?;

            gate.commit(tx)?;
            Ok(())
        })
        .await
    }

    async fn unassign_role(&self, role_name: &str, actor: &Actor) -> Result<()> {
        validate_role_name(role_name)?;
        validate_actor(actor)?;
        let role_name = role_name.to_string();
        let actor = actor.clone();

        self.blocking(move |conn, gate| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            require_role(&tx, &role_name)?;
            if !actor_exists(&tx, &actor)? {
                return Err(DomainError::NotFound(Entity::Actor).into());
            }

            let removed = tx.execute(
                "DELETE FROM role_assignments
                 WHERE domain_id = ?1 AND issuer = ?2 AND role_name = ?3",
                params![actor.domain_id, actor.issuer, role_name],
            )?;
            if removed == 0 {
                return Err(DomainError::NotFound(Entity::Assignment).into());
            }

            gate.commit(tx)?;
            Ok(())
        })
        .await
    }

    async fn list_role_actors(&self, role_name: &str) -> Result<Vec<Actor>> {
        let role_name = role_name.to_string();

        self.blocking(move |conn, _| {
            let tx = conn.transaction()?;
            require_role(&tx, &role_name)?;

            let actors = {
                let mut stmt = tx.prepare(
                    "SELECT domain_id, issuer FROM role_assignments
                     WHERE role_name = ?1 ORDER BY domain_id, issuer",
                )?;
                let rows = stmt
                    .query_map(params![role_name], row_to_actor)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };

            tx.commit()?;
            Ok(actors)
        })
        .await
    }

    async fn actor_grants(&self, actor: &Actor) -> Result<Option<ActorGrants>> {
        let actor = actor.clone();

        self.blocking(move |conn, _| {
            let tx = conn.transaction()?;

            if !actor_exists(&tx, &actor)? {
                return Ok(None);
            }

            let assigned: Vec<(String, bool)> = {
                let mut stmt = tx.prepare(
                    "SELECT ra.role_name, r.name IS NOT NULL
                     FROM role_assignments ra
                     LEFT JOIN roles r ON r.name = ra.role_name
                     WHERE ra.domain_id = ?1 AND ra.issuer = ?2
                     ORDER BY ra.role_name",
                )?;
                let rows = stmt
                    .query_map(params![actor.domain_id, actor.issuer], |row| {
                        Ok((row.get(0)?, row.get(1)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };

            let mut roles = Vec::with_capacity(assigned.len());
            for (name, live) in assigned {
                let permissions = if live {
                    Some(load_permissions(&tx, &name)?)
                } else {
                    None
                };
                roles.push(GrantedRole { name, permissions });
            }

            tx.commit()?;
            Ok(Some(ActorGrants { actor, roles }))
        })
        .await
    }
}
