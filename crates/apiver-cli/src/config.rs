//! Configuration management for the apiver CLI
//!
//! Defaults, then an optional TOML config file, then `APIVER_*` environment
//! variables. Command-line flags are applied last by the commands themselves.

use crate::error::{CliError, Result};
use apiver_core::report::DEFAULT_CHANGELOG;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// Directory, next to the manifest, that holds the default database
pub const STATE_DIR: &str = ".apiver";

/// Default database file name inside [`STATE_DIR`]
pub const DEFAULT_DATABASE_FILE: &str = "api.db";

/// Keys understood by `apiver config get`
pub const CONFIG_KEYS: &[&str] = &["database", "changelog"];

/// CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Project database; `None` means `.apiver/api.db` next to the manifest
    pub database: Option<PathBuf>,

    /// Changelog written by real `bump` runs
    pub changelog: Option<PathBuf>,
}

impl Config {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the config file (if any), then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Some(path) if path.is_file() => Self::from_file(&path)?,
            _ => Self::new(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            CliError::config(format!("Invalid config file '{}': {}", path.display(), e))
        })
    }

    /// Location of the config file: `$APIVER_CONFIG`, else
    /// `<config_dir>/apiver/config.toml`
    pub fn config_file_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("APIVER_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("apiver").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(database) = std::env::var("APIVER_DATABASE") {
            self.database = Some(PathBuf::from(database));
        }

        if let Ok(changelog) = std::env::var("APIVER_CHANGELOG") {
            self.changelog = Some(PathBuf::from(changelog));
        }
    }

    /// Database path for a manifest, honoring an explicit override
    pub fn database_for(&self, manifest_path: &Path, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit.or(self.database.as_deref()) {
            return path.to_path_buf();
        }
        manifest_dir(manifest_path)
            .join(STATE_DIR)
            .join(DEFAULT_DATABASE_FILE)
    }

    /// Changelog path (relative paths resolve against the working directory)
    pub fn changelog(&self) -> PathBuf {
        self.changelog
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CHANGELOG))
    }

    /// Effective value of a single key
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "database" => Ok(self
                .database
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| format!("<manifest dir>/{}/{}", STATE_DIR, DEFAULT_DATABASE_FILE))),
            "changelog" => Ok(self.changelog().display().to_string()),
            _ => Err(CliError::config(format!(
                "Unknown key '{}'; expected one of: {}",
                key,
                CONFIG_KEYS.join(", ")
            ))),
        }
    }
}

/// Directory containing the manifest (`.` for a bare file name)
pub fn manifest_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
