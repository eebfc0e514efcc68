//! Configuration for the facade and for a whole service.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use rolegate_store::{PolicyStore, StoreConfig};

use crate::authorizer::Authorizer;

/// Configuration for the [`Authorizer`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthorizerConfig {
    /// Deadline for every facade call, in milliseconds. `None` disables it.
    pub op_timeout_ms: Option<u64>,
    /// Whether decision operations reject empty identifiers.
    pub validate_inputs: bool,
}

impl AuthorizerConfig {
    pub fn op_timeout(&self) -> Option<Duration> {
        self.op_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: Some(5_000),
            validate_inputs: true,
        }
    }
}

/// Everything a rolegate process needs to build its facade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub store: StoreConfig,
    pub authorizer: AuthorizerConfig,
}

impl ServiceConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("parse rolegate service config")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read rolegate config: {}", path.display()))?;
        Self::from_json(&contents)
    }

    /// Open the configured store and wrap it in a facade.
    pub fn open(&self) -> anyhow::Result<Authorizer<Arc<dyn PolicyStore>>> {
        let store = self.store.open().context("open policy store")?;
        Ok(Authorizer::new(store, self.authorizer.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthorizerConfig::default();
        assert_eq!(config.op_timeout(), Some(Duration::from_secs(5)));
        assert!(config.validate_inputs);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ServiceConfig::from_json(r#"{"authorizer":{"op_timeout_ms":250}}"#).unwrap();
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.authorizer.op_timeout(), Some(Duration::from_millis(250)));
        assert!(config.authorizer.validate_inputs);
    }

    #[test]
    fn test_disable_timeout() {
        let config = ServiceConfig::from_json(r#"{"authorizer":{"op_timeout_ms":null}}"#).unwrap();
        assert_eq!(config.authorizer.op_timeout(), None);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = ServiceConfig::from_json_file("/nonexistent/rolegate.json").unwrap_err();
        assert!(err.to_string().contains("read rolegate config"));
    }
}
