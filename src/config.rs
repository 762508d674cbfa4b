//! Server configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! bind_address = "0.0.0.0:8080"
//! default_handler_pool_size = 4
//!
//! [resources.users]
//! handler_pool_size = 16
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g. `"0.0.0.0:8080"`).
    pub bind_address: String,

    /// Pool size for resources without their own entry.
    pub default_handler_pool_size: usize,

    /// Per-resource settings, keyed by resource name.
    pub resources: HashMap<String, ResourceConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_owned(),
            default_handler_pool_size: 1,
            resources: HashMap::new(),
        }
    }
}

/// Settings for one named resource.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub handler_pool_size: Option<usize>,
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Pool size for the resource called `name`.
    pub fn handler_pool_size(&self, name: &str) -> usize {
        self.resources
            .get(name)
            .and_then(|r| r.handler_pool_size)
            .unwrap_or(self.default_handler_pool_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_all_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.handler_pool_size("anything"), 1);
    }

    #[test]
    fn resolves_per_resource_pool_sizes() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind_address = "127.0.0.1:9000"
            default_handler_pool_size = 4

            [resources.users]
            handler_pool_size = 16

            [resources.orders]
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.handler_pool_size("users"), 16);
        assert_eq!(config.handler_pool_size("orders"), 4);
        assert_eq!(config.handler_pool_size("missing"), 4);
    }

    #[test]
    fn rejects_wrong_types() {
        let err = ServerConfig::from_toml_str("default_handler_pool_size = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
