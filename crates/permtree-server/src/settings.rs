//! Server configuration loading.
//!
//! Values come from an optional YAML file (path in `PERMTREE_CONFIG`,
//! default `permtree.yaml`) overridden by `PERMTREE__`-prefixed
//! environment variables, e.g. `PERMTREE__DB__ENDPOINT=mem://` or
//! `PERMTREE__HIERARCHY__DEFAULT_DELIMITER=.`.

use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use permtree_db::DbConfig;
use permtree_hierarchy::HierarchyConfig;
use serde::Deserialize;

pub const CONFIG_PATH_ENV: &str = "PERMTREE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "permtree.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Tracing directive added on top of `RUST_LOG`.
    pub log_level: String,
    pub db: DbConfig,
    pub hierarchy: HierarchyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "permtree=info".into(),
            db: DbConfig::default(),
            hierarchy: HierarchyConfig::default(),
        }
    }
}

/// Load configuration from `path` (if it exists) and the environment.
pub fn load<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ConfigError> {
    ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).required(false))
        .add_source(
            Environment::with_prefix("PERMTREE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// Path named by `PERMTREE_CONFIG`, or [`DEFAULT_CONFIG_PATH`].
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load("does-not-exist.yaml").unwrap();
        assert_eq!(config.log_level, "permtree=info");
        assert_eq!(config.hierarchy, HierarchyConfig::default());
        assert_eq!(config.db.namespace, "permtree");
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("permtree-{}.yaml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "hierarchy:\n  default_delimiter: \".\"\n  max_page_size: 50\ndb:\n  endpoint: \"mem://\""
        )
        .unwrap();

        let config = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.hierarchy.default_delimiter, ".");
        assert_eq!(config.hierarchy.max_page_size, 50);
        assert_eq!(config.hierarchy.default_page_size, 30);
        assert_eq!(config.db.endpoint, "mem://");
    }
}
