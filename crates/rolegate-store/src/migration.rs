//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1. Migrations run once, at
//! open time; request handling assumes a schema-correct database.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current = current_version(conn)?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::info!(version, "applied policy schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Read the applied schema version (0 for a fresh database).
pub fn current_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Roles: unique by name
        CREATE TABLE roles (
            name TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        );

        -- Permissions: owned by exactly one role, no identity of their own
        CREATE TABLE permissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            role_name TEXT NOT NULL REFERENCES roles(name) ON DELETE CASCADE,
            name TEXT NOT NULL,
            resource_pattern TEXT NOT NULL
        );

        -- Actor records: created explicitly or on first assignment, never deleted
        CREATE TABLE actors (
            domain_id TEXT NOT NULL,
            issuer TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (domain_id, issuer)
        );

        -- Role assignments: unique per (actor, role)
        CREATE TABLE role_assignments (
            domain_id TEXT NOT NULL,
            issuer TEXT NOT NULL,
            role_name TEXT NOT NULL REFERENCES roles(name) ON DELETE CASCADE,
            assigned_at INTEGER NOT NULL,
            PRIMARY KEY (domain_id, issuer, role_name),
            FOREIGN KEY (domain_id, issuer) REFERENCES actors(domain_id, issuer)
        );

        -- Indexes for common queries
        CREATE INDEX idx_permissions_role ON permissions(role_name);
        CREATE INDEX idx_permissions_name ON permissions(name);
        CREATE INDEX idx_assignments_role ON role_assignments(role_name);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        // Verify tables exist
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"roles".to_string()));
        assert!(tables.contains(&"permissions".to_string()));
        assert!(tables.contains(&"actors".to_string()));
        assert!(tables.contains(&"role_assignments".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap(); // Should not error
        migrate(&mut conn).unwrap(); // Still should not error

        assert_eq!(current_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, 0)",
            [CURRENT_VERSION + 1],
        )
        .unwrap();

        let result = migrate(&mut conn);
        assert!(matches!(result, Err(StoreError::Migration(_))));
    }
}
