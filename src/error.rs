//! Error types for offgrid
//!
//! All modules use `OffgridResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for offgrid operations
pub type OffgridResult<T> = Result<T, OffgridError>;

/// All errors that can occur in offgrid
#[derive(Error, Debug)]
pub enum OffgridError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Configuration file already exists: {0}")]
    ConfigExists(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    // Cache storage errors
    #[error("Cache storage error in partition {partition}: {reason}")]
    CacheStorage { partition: String, reason: String },

    #[error("Invalid partition name: {0}")]
    InvalidPartitionName(String),

    // Lifecycle errors
    #[error("Install of version {version} failed: {reason}")]
    InstallFailed { version: String, reason: String },

    #[error("Invalid controller state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("No installed version found")]
    NotInstalled,

    // Server errors
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl OffgridError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a request URL
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a cache storage error for a partition
    pub fn storage(partition: impl Into<String>, reason: impl ToString) -> Self {
        Self::CacheStorage {
            partition: partition.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::CacheStorage { .. } | Self::InstallFailed { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotInstalled => Some("Run: offgrid install"),
            Self::ConfigNotFound(_) => Some("Run: offgrid config init"),
            Self::ConfigExists(_) => Some("Pass --force to overwrite"),
            Self::InstallFailed { .. } => {
                Some("Check that the origin serves every [precache] entry")
            }
            Self::Bind { .. } => Some("Pick another address with --listen"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OffgridError::network("http://origin/a.png", "connection refused");
        assert!(err.to_string().contains("http://origin/a.png"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_hint() {
        let err = OffgridError::NotInstalled;
        assert_eq!(err.hint(), Some("Run: offgrid install"));
    }

    #[test]
    fn error_retryable() {
        assert!(OffgridError::network("u", "r").is_retryable());
        assert!(!OffgridError::NotInstalled.is_retryable());
    }
}
