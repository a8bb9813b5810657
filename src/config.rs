//! Configuration for the rewriter.
//!
//! ```toml
//! # qail-idempotent.toml
//! migrations_dir = "infrastructure/migrations/adapted"
//! extension = "sql"
//! schema = "public"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "qail-idempotent.toml";

pub const DEFAULT_MIGRATIONS_DIR: &str = "infrastructure/migrations/adapted";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory scanned for migration files.
    pub migrations_dir: PathBuf,
    /// File extension of migration files, without the dot.
    pub extension: String,
    /// Schema qualifier for the table and enum rules.
    pub schema: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            extension: "sql".to_string(),
            schema: crate::rules::DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `./qail-idempotent.toml` is
    /// tried, then `<config dir>/qail/idempotent.toml`, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in Self::search_paths() {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading config");
                return Self::from_file(&candidate);
            }
        }

        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("qail").join("idempotent.toml"));
        }
        paths
    }
}
