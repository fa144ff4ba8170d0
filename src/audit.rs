//! Audit journal of lifecycle events
//!
//! One JSON object per line in `audit.log`, next to the controller record in
//! the cache directory. Journal writes never fail a lifecycle step.

use crate::config::{schema::Config, ConfigManager};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const JOURNAL_FILE: &str = "audit.log";

/// Something the lifecycle did that an operator may want to trace later
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum AuditEvent {
    #[serde(rename = "lifecycle.installed")]
    Installed {
        version: String,
        precached: usize,
        fonts: usize,
        failed: usize,
    },
    #[serde(rename = "lifecycle.install_failed")]
    InstallFailed { version: String, error: String },
    #[serde(rename = "lifecycle.activated")]
    Activated {
        version: String,
        deleted: Vec<String>,
        retained: Vec<String>,
        clients_claimed: usize,
    },
    #[serde(rename = "gc.partition_deleted")]
    PartitionDeleted {
        partition: String,
        active_version: String,
    },
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Installed { .. } => "lifecycle.installed",
            Self::InstallFailed { .. } => "lifecycle.install_failed",
            Self::Activated { .. } => "lifecycle.activated",
            Self::PartitionDeleted { .. } => "gc.partition_deleted",
        }
    }
}

#[derive(Serialize)]
struct JournalLine<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    event: &'a AuditEvent,
}

/// Append-only JSON-lines journal
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    /// Journal in the configured cache directory, or a no-op when disabled
    pub fn new(config: &Config) -> Self {
        if config.general.audit_log {
            Self::at(Self::journal_path(config))
        } else {
            Self::disabled()
        }
    }

    /// Where the journal for a config lives
    pub fn journal_path(config: &Config) -> PathBuf {
        ConfigManager::cache_dir(config).join(JOURNAL_FILE)
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an event, stamped with the current time
    pub async fn record(&self, event: AuditEvent) {
        let Some(path) = &self.path else {
            return;
        };

        let line = JournalLine {
            timestamp: Utc::now(),
            event: &event,
        };
        let mut encoded = match serde_json::to_vec(&line) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(event = event.name(), error = %e, "Could not encode audit event");
                return;
            }
        };
        encoded.push(b'\n');

        match append(path, &encoded).await {
            Ok(()) => debug!(event = event.name(), "Audited"),
            Err(e) => warn!(event = event.name(), path = %path.display(), error = %e, "Audit write failed"),
        }
    }
}

async fn append(path: &Path, line: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut journal = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    journal.write_all(line).await?;
    journal.flush().await
}
