//! Error types for apiver

use thiserror::Error;

/// Result type alias for apiver operations
pub type Result<T> = std::result::Result<T, ApiverError>;

/// Main error type for the version-decision engine
#[derive(Error, Debug)]
pub enum ApiverError {
    #[error("Invalid version string '{0}': expected MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]")]
    InvalidVersion(String),

    #[error("Version '{0}' cannot be incremented: a numeric component is already at its maximum")]
    VersionOverflow(String),

    #[error("Invalid prerelease string '{value}': {reason}")]
    InvalidPrerelease { value: String, reason: String },

    #[error("Invalid build metadata string '{value}': {reason}")]
    InvalidBuildMetadata { value: String, reason: String },

    #[error("Source types not explicitly specified; unable to determine source file types{0}")]
    UnspecifiedSourceTypes(String),

    #[error("Missing API functionality: {0}")]
    MissingApiFunctionality(String),

    #[error("Mismatched API argument: {0}")]
    MismatchedApiArgument(String),

    #[error("Checker '{checker}' could not be run: {message}")]
    Checker { checker: String, message: String },

    #[error("Project store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiverError {
    /// Create an invalid prerelease error
    pub fn invalid_prerelease(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPrerelease {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid build metadata error
    pub fn invalid_build_metadata(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBuildMetadata {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether this error came out of an invariant checker verdict
    /// (as opposed to a checker that could not run at all).
    pub fn is_check_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingApiFunctionality(_) | Self::MismatchedApiArgument(_)
        )
    }
}
