use crate::engine::TantivyEngineConfig;
use crate::error::Result;
use crate::search::IndexSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Index facade configuration
    pub index: IndexSettings,

    /// Engine configuration
    #[serde(default)]
    pub engine: TantivyEngineConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, the file named by
    /// `SEARCH_PROXY_CONFIG` (if any) and the environment
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SEARCH_PROXY_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load configuration with an explicit override file. Without one,
    /// `search-proxy.toml` in the working directory is used when present.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("search-proxy").required(false),
        };

        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file
            .add_source(file)
            // Override with environment variables (prefix: SEARCH_PROXY_)
            .add_source(
                config::Environment::with_prefix("SEARCH_PROXY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("index.wildcard_fields"),
            )
            .build()?
            .try_deserialize()?;

        config.index.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::FieldKind;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.index.name, "entries");
        assert_eq!(config.index.batch_limit(), Some(500));
        assert!(config.index.validate().is_ok());
        assert!(config.engine.index_dir.is_some());
        assert!(config
            .engine
            .fields
            .iter()
            .any(|field| field.kind == FieldKind::Integer));
        assert_eq!(config.observability.log_filter, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("override.toml");
        std::fs::write(&path, "[index]\nname = \"other\"\nmax_batch_size = -1\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();

        assert_eq!(config.index.name, "other");
        assert_eq!(config.index.batch_limit(), None);
        assert_eq!(config.index.wildcard_fields, vec!["name", "desc", "ident"]);
    }

    #[test]
    fn test_empty_index_name_rejected() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[index]\nname = \"\"\n").unwrap();

        assert!(matches!(
            Config::load_from(Some(&path)),
            Err(crate::error::IndexError::InvalidConfiguration(_))
        ));
    }
}
