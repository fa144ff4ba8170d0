//! Configuration schema for offgrid
//!
//! Configuration is stored at `~/.config/offgrid/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Upstream site origin
    pub origin: OriginConfig,

    /// Cache storage settings
    pub cache: CacheConfig,

    /// Request classification settings
    pub routing: RoutingConfig,

    /// Install-time precache settings
    pub precache: PrecacheConfig,

    /// Lifecycle behaviour
    pub lifecycle: LifecycleConfig,

    /// Proxy server settings
    pub server: ServerConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging of lifecycle events
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Upstream origin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Site origin that relative request targets resolve against
    pub url: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// Storage backend for cache partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Partitions persisted on disk
    File,
    /// Partitions held in process memory
    Memory,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory for partitions (default: state dir)
    pub dir: Option<PathBuf>,

    /// Active version tag embedded in every partition name
    pub version: String,

    /// Storage backend
    pub storage: StorageKind,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            version: "v1".to_string(),
            storage: StorageKind::File,
        }
    }
}

/// Request classification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path prefix of API traffic, never intercepted
    pub api_prefix: String,

    /// Hosts serving CMS uploaded media
    pub media_hosts: Vec<String>,

    /// Path prefix of the uploaded-media directory on media hosts
    pub media_path: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".to_string(),
            media_hosts: vec![],
            media_path: "/uploads/".to_string(),
        }
    }
}

/// Precache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecacheConfig {
    /// Ordered absolute paths written to the precache partition at install
    pub manifest: Vec<String>,

    /// Document served to navigations when offline
    pub offline_document: Option<String>,

    /// Image served when an image cannot be resolved
    pub placeholder_image: Option<String>,

    /// Critical fonts written to the font partition at install
    pub fonts: Vec<String>,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            manifest: vec!["/".to_string(), "/offline.html".to_string()],
            offline_document: Some("/offline.html".to_string()),
            placeholder_image: None,
            fonts: vec![],
        }
    }
}

/// Lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Activate immediately after install instead of waiting
    pub skip_waiting: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            skip_waiting: true,
        }
    }
}

/// Proxy server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen: String,

    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}
