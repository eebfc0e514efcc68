//! Store selection.
//!
//! A [`StoreConfig`] names the backend a deployment runs on. It deserializes
//! from JSON so it can sit inside a larger service configuration.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Result, StoreError};
use crate::memory::MemoryStore;
use crate::sqlite::SqliteStore;
use crate::traits::PolicyStore;

/// Which backend holds the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// The in-memory reference store. Policy is lost on restart.
    #[default]
    Memory,
    /// A SQLite database file, migrated on open.
    Sqlite {
        path: PathBuf,
    },
}

impl StoreConfig {
    /// Parse a store configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Open the configured store.
    pub fn open(&self) -> Result<Arc<dyn PolicyStore>> {
        match self {
            StoreConfig::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreConfig::Sqlite { path } => {
                tracing::info!(path = %path.display(), "opening sqlite policy store");
                Ok(Arc::new(SqliteStore::open(path)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory() {
        let config = StoreConfig::from_json(r#"{"backend":"memory"}"#).unwrap();
        assert_eq!(config, StoreConfig::Memory);
    }

    #[test]
    fn test_parse_sqlite() {
        let config =
            StoreConfig::from_json(r#"{"backend":"sqlite","path":"/var/lib/rolegate.db"}"#)
                .unwrap();
        assert_eq!(
            config,
            StoreConfig::Sqlite {
                path: PathBuf::from("/var/lib/rolegate.db")
            }
        );
    }

    #[test]
    fn test_parse_unknown_backend() {
        let result = StoreConfig::from_json(r#"{"backend":"postgres"}"#);
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_open_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::Sqlite {
            path: dir.path().join("policy.db"),
        };

        let store = config.open().unwrap();
        store.create_role("viewer", &[]).await.unwrap();
        assert_eq!(store.list_roles().await.unwrap().len(), 1);
    }
}
