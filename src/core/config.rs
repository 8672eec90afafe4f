//! Configuration management

use crate::core::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub query: QueryConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names never descended into
    pub ignore_dirs: Vec<String>,
    /// Maximum file size to read (bytes)
    pub max_file_size: u64,
    /// Honour .gitignore / .ignore files
    pub respect_gitignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Depth used when a query does not give one
    pub default_max_depth: usize,
    /// Upper bound on paths returned by a single path query
    pub max_paths: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached analyses
    pub max_entries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "__pycache__".to_string(),
            ],
            max_file_size: MAX_FILE_SIZE,
            respect_gitignore: true,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_max_depth: DEFAULT_MAX_DEPTH,
            max_paths: crate::graph::DEFAULT_MAX_PATHS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 16 }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(Error::ConfigError {
                message: "cache.max_entries must be at least 1".to_string(),
            });
        }
        if self.query.max_paths == 0 {
            return Err(Error::ConfigError {
                message: "query.max_paths must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = Self::archviz_home()?;
        Ok(home.join("config.toml"))
    }

    /// Get the archviz home directory
    pub fn archviz_home() -> Result<PathBuf> {
        // Check ARCHVIZ_HOME env var first
        if let Ok(home) = std::env::var("ARCHVIZ_HOME") {
            return Ok(PathBuf::from(home));
        }

        // Use XDG directories
        ProjectDirs::from("dev", "archviz", "archviz")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| Error::ConfigError {
                message: "Could not determine archviz home directory".to_string(),
            })
    }
}

pub const MAX_FILE_SIZE: u64 = 1_048_576; // 1MB
pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_SERVER_PORT: u16 = 8000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
[query]
default_max_depth = 3

[server]
port = 9100
"#,
        )
        .unwrap();

        assert_eq!(config.query.default_max_depth, 3);
        assert_eq!(config.query.max_paths, crate::graph::DEFAULT_MAX_PATHS);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.scan.ignore_dirs.contains(&"__pycache__".to_string()));
    }

    #[test]
    fn test_zero_cache_entries_rejected() {
        let err = Config::from_toml("[cache]\nmax_entries = 0\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError { .. }));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let err = Config::from_toml("[scan\n").unwrap_err();
        assert!(matches!(err, Error::TomlParse(_)));
    }
}
