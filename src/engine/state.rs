//! Persisted controller lifecycle record
//!
//! The record lives next to the partitions so a restarted process resumes
//! from the same durable state the cache store holds.

use crate::config::schema::StorageKind;
use crate::config::{Config, ConfigManager};
use crate::error::{OffgridError, OffgridResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

const RECORD_FILE: &str = "controller.json";

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    /// Installed, not yet activated
    Waiting,
    Activating,
    Active,
    /// Install failed; this version never activates
    Redundant,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Waiting => write!(f, "waiting"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Durable lifecycle state of the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerRecord {
    /// Identifier of the install attempt that produced this record
    pub id: Uuid,

    /// Most recent version seen by install
    pub version: String,

    /// State of `version`
    pub state: LifecycleState,

    /// Version currently controlling clients, if any
    pub active_version: Option<String>,

    /// Number of precache entries stored by the last install
    pub precached: usize,

    pub installed_at: Option<DateTime<Utc>>,
    pub activated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ControllerRecord {
    /// Start a record for a new install attempt, carrying over the active version
    pub fn begin(version: impl Into<String>, active_version: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: version.into(),
            state: LifecycleState::Installing,
            active_version,
            precached: 0,
            installed_at: None,
            activated_at: None,
            updated_at: Utc::now(),
        }
    }

    pub fn transition(&mut self, state: LifecycleState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// Whether `version` is installed and controlling clients
    pub fn is_active(&self, version: &str) -> bool {
        self.state == LifecycleState::Active && self.active_version.as_deref() == Some(version)
    }
}

/// Where controller records are kept
#[derive(Debug, Clone)]
pub enum RecordStore {
    /// JSON file in the cache root
    File(PathBuf),
    /// Process memory, paired with the in-memory cache store
    Memory(Arc<RwLock<Option<ControllerRecord>>>),
}

impl RecordStore {
    pub fn from_config(config: &Config) -> Self {
        match config.cache.storage {
            StorageKind::File => Self::File(ConfigManager::cache_dir(config).join(RECORD_FILE)),
            StorageKind::Memory => Self::memory(),
        }
    }

    pub fn memory() -> Self {
        Self::Memory(Arc::new(RwLock::new(None)))
    }

    /// Load the current record
    pub async fn load(&self) -> OffgridResult<Option<ControllerRecord>> {
        match self {
            Self::Memory(slot) => Ok(slot.read().await.clone()),
            Self::File(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                let content = fs::read_to_string(path).await.map_err(|e| {
                    OffgridError::io(format!("reading controller record {}", path.display()), e)
                })?;
                Ok(Some(serde_json::from_str(&content)?))
            }
        }
    }

    /// Persist a record, replacing the previous one atomically
    pub async fn save(&self, record: &ControllerRecord) -> OffgridResult<()> {
        match self {
            Self::Memory(slot) => {
                *slot.write().await = Some(record.clone());
                Ok(())
            }
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await.map_err(|e| {
                        OffgridError::io(format!("creating directory {}", parent.display()), e)
                    })?;
                }
                let content = serde_json::to_string_pretty(record)?;
                let tmp = path.with_extension(format!("json.{}", Uuid::new_v4()));
                fs::write(&tmp, content)
                    .await
                    .map_err(|e| OffgridError::io("writing controller record", e))?;
                fs::rename(&tmp, path)
                    .await
                    .map_err(|e| OffgridError::io("replacing controller record", e))
            }
        }
    }
}
