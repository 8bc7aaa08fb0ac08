//! Error types for the apiver CLI
//!
//! User-facing errors with clear, actionable messages.

use apiver_core::ApiverError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Version decision, digest or checker failure
    #[error(transparent)]
    Core(#[from] ApiverError),

    /// Required file is missing
    #[error("File not found: '{0}'. Verify the file path exists and you have read permissions.")]
    FileNotFound(String),

    /// API manifest has invalid format or content
    #[error("Invalid API manifest: {0}. Run 'apiver init' to create a valid manifest.")]
    InvalidManifest(String),

    /// Project directory already has an api.toml
    #[error("Project already initialized: {0}. Use --force to reinitialize.")]
    AlreadyInitialized(String),

    /// Project database operation failed (rusqlite)
    #[error("Project database error: {0}. Check the --database path or delete the database to start over.")]
    Store(#[from] rusqlite::Error),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or config file.")]
    Config(String),

    /// TOML parsing failed
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// YAML parsing failed
    #[error("Failed to parse YAML: {0}. Check the file syntax at the indicated line/column.")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}. Check the file syntax.")]
    JsonParse(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid manifest error
    pub fn invalid_manifest(msg: impl Into<String>) -> Self {
        Self::InvalidManifest(msg.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_pass_through() {
        let err: CliError = ApiverError::InvalidVersion("1.x".to_string()).into();
        assert!(err.to_string().starts_with("Invalid version string '1.x'"));
    }

    #[test]
    fn test_messages_are_actionable() {
        let err = CliError::invalid_manifest("missing [project] table");
        assert!(err.to_string().contains("apiver init"));

        let err = CliError::config("unknown key 'colour'");
        assert!(err.to_string().contains("config file"));
    }
}
