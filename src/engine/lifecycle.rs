//! Install, activate and resume
//!
//! Install fills the precache and font partitions for the configured
//! version. Activate garbage-collects partitions left by other versions and
//! claims every client. Install is the only step whose failure is fatal: a
//! version that cannot precache its core entries never activates, and the
//! previously active version keeps serving.

use crate::audit::{AuditEvent, AuditLog};
use crate::cache::{CacheManager, Partition, PartitionSet};
use crate::config::Config;
use crate::engine::clients::ClientRegistry;
use crate::engine::state::{ControllerRecord, LifecycleState, RecordStore};
use crate::engine::Engine;
use crate::error::{OffgridError, OffgridResult};
use crate::fetch::{resolve_target, FetchRequest, Fetcher, HttpFetcher};
use chrono::Utc;
use futures_util::future::join_all;
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

/// A manifest or font entry that could not be stored
#[derive(Debug, Clone, Serialize)]
pub struct FailedEntry {
    pub path: String,
    pub reason: String,
}

/// Outcome of a successful install
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub precached: usize,
    pub fonts_cached: usize,
    pub failed: Vec<FailedEntry>,
}

/// Outcome of an activation
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub version: String,
    pub deleted: Vec<String>,
    /// Stale partitions whose deletion failed
    pub retained: Vec<String>,
    pub clients_claimed: usize,
}

/// What `boot` ended up doing
#[derive(Debug)]
pub enum BootReport {
    /// Version was already active; nothing was reinstalled
    Resumed { version: String },
    /// Version activated, after installing unless it was already waiting
    Activated {
        install: Option<InstallReport>,
        activate: ActivateReport,
    },
    /// Version installed but waiting; the previous version keeps serving
    Waiting {
        install: Option<InstallReport>,
        serving: String,
    },
    /// Install failed; the previous version keeps serving
    KeptPrevious { serving: String, error: OffgridError },
}

impl BootReport {
    /// Version now controlling clients
    pub fn serving(&self) -> &str {
        match self {
            Self::Resumed { version } => version,
            Self::Activated { activate, .. } => &activate.version,
            Self::Waiting { serving, .. } | Self::KeptPrevious { serving, .. } => serving,
        }
    }
}

/// Lifecycle controller for the configured version
pub struct Lifecycle {
    config: Config,
    partitions: PartitionSet,
    cache: CacheManager,
    fetcher: Arc<dyn Fetcher>,
    records: RecordStore,
    clients: ClientRegistry,
    audit: AuditLog,
}

impl Lifecycle {
    pub fn new(
        config: Config,
        cache: CacheManager,
        fetcher: Arc<dyn Fetcher>,
        records: RecordStore,
        clients: ClientRegistry,
        audit: AuditLog,
    ) -> Self {
        Self {
            partitions: PartitionSet::new(config.cache.version.clone()),
            config,
            cache,
            fetcher,
            records,
            clients,
            audit,
        }
    }

    /// Wire up the configured storage, network client and audit journal
    pub fn from_config(config: &Config) -> OffgridResult<Self> {
        let fetcher = HttpFetcher::new(Duration::from_secs(config.server.request_timeout_secs))?;
        Ok(Self::new(
            config.clone(),
            CacheManager::from_config(config),
            Arc::new(fetcher),
            RecordStore::from_config(config),
            ClientRegistry::new(),
            AuditLog::new(config),
        ))
    }

    pub fn version(&self) -> &str {
        self.partitions.version()
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        self.fetcher.clone()
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub async fn record(&self) -> OffgridResult<Option<ControllerRecord>> {
        self.records.load().await
    }

    /// Build an engine serving `version`
    pub fn engine(&self, version: &str) -> OffgridResult<Arc<Engine>> {
        Ok(Arc::new(Engine::new(
            &self.config,
            version,
            self.cache.clone(),
            self.fetcher.clone(),
        )?))
    }

    /// Engine for whichever version the record says is active
    pub async fn active_engine(&self) -> OffgridResult<Arc<Engine>> {
        let version = self
            .records
            .load()
            .await?
            .and_then(|r| r.active_version)
            .ok_or(OffgridError::NotInstalled)?;
        self.engine(&version)
    }

    fn site(&self) -> OffgridResult<Url> {
        Url::parse(&self.config.origin.url).map_err(|e| OffgridError::InvalidUrl {
            url: self.config.origin.url.clone(),
            reason: e.to_string(),
        })
    }

    /// Install: precache the manifest and critical fonts
    pub async fn on_install(&self) -> OffgridResult<InstallReport> {
        let version = self.version().to_string();
        let prior = self.records.load().await?;
        let active_version = prior.as_ref().and_then(|r| r.active_version.clone());
        let mut record = ControllerRecord::begin(&version, active_version);
        self.records.save(&record).await?;
        info!(version = %version, "Installing");

        match self.precache().await {
            Ok(report) => {
                record.precached = report.precached;
                record.installed_at = Some(Utc::now());
                record.transition(LifecycleState::Waiting);
                self.records.save(&record).await?;

                self.audit
                    .record(AuditEvent::Installed {
                        version: version.clone(),
                        precached: report.precached,
                        fonts: report.fonts_cached,
                        failed: report.failed.len(),
                    })
                    .await;
                info!(
                    version = %version,
                    precached = report.precached,
                    fonts = report.fonts_cached,
                    "Installed"
                );
                Ok(report)
            }
            Err(e) => {
                // A failed reinstall of the serving version leaves it serving
                let settled = match prior {
                    Some(prior) if prior.is_active(&version) => prior,
                    _ => {
                        record.transition(LifecycleState::Redundant);
                        record
                    }
                };
                if let Err(save_err) = self.records.save(&settled).await {
                    warn!(error = %save_err, state = ?settled.state, "Failed to persist state after failed install");
                }
                self.audit
                    .record(AuditEvent::InstallFailed {
                        version: version.clone(),
                        error: e.to_string(),
                    })
                    .await;
                error!(version = %version, error = %e, "Install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> OffgridResult<InstallReport> {
        let site = self.site()?;
        let precache_config = &self.config.precache;
        let precache = self.cache.open(&self.partitions.precache()).await?;

        let core: Vec<&str> = [
            precache_config.offline_document.as_deref(),
            precache_config.placeholder_image.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut paths: Vec<&str> = precache_config.manifest.iter().map(String::as_str).collect();
        for path in &core {
            if !paths.contains(path) {
                paths.push(path);
            }
        }

        let results = join_all(
            paths
                .iter()
                .map(|path| self.store_asset(&site, &precache, path)),
        )
        .await;

        let mut failed = Vec::new();
        let mut precached = 0;
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(()) => precached += 1,
                Err(reason) => {
                    warn!(path, reason = %reason, "Precache entry failed");
                    failed.push(FailedEntry {
                        path: path.to_string(),
                        reason,
                    });
                }
            }
        }

        if !paths.is_empty() && precached == 0 {
            return Err(OffgridError::InstallFailed {
                version: self.version().to_string(),
                reason: "no precache entry could be stored".to_string(),
            });
        }
        if let Some(entry) = failed.iter().find(|f| core.contains(&f.path.as_str())) {
            return Err(OffgridError::InstallFailed {
                version: self.version().to_string(),
                reason: format!("core entry {}: {}", entry.path, entry.reason),
            });
        }

        let fonts = self.cache.open(&self.partitions.fonts()).await?;
        let font_results = join_all(
            precache_config
                .fonts
                .iter()
                .map(|path| self.store_asset(&site, &fonts, path)),
        )
        .await;

        let mut fonts_cached = 0;
        for (path, result) in precache_config.fonts.iter().zip(font_results) {
            match result {
                Ok(()) => fonts_cached += 1,
                Err(reason) => {
                    warn!(path = %path, reason = %reason, "Font precache failed");
                    failed.push(FailedEntry {
                        path: path.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(InstallReport {
            version: self.version().to_string(),
            precached,
            fonts_cached,
            failed,
        })
    }

    /// Fetch one asset and store it strictly; the error is a display reason
    async fn store_asset(&self, site: &Url, partition: &Partition, path: &str) -> Result<(), String> {
        let url = resolve_target(site, path).map_err(|e| e.to_string())?;
        let request = FetchRequest::get(url);
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| e.to_string())?;

        if response.status != StatusCode::OK {
            return Err(format!("origin returned {}", response.status));
        }

        match partition.try_put(&request, &response).await {
            Ok(true) => {
                debug!(path, partition = partition.name(), "Precached");
                Ok(())
            }
            Ok(false) => Err("response is not cacheable".to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Activate: garbage-collect other versions and claim clients
    pub async fn on_activate(&self) -> OffgridResult<ActivateReport> {
        let version = self.version().to_string();
        let mut record = self
            .records
            .load()
            .await?
            .filter(|r| r.version == version)
            .ok_or(OffgridError::NotInstalled)?;

        if !matches!(
            record.state,
            LifecycleState::Waiting | LifecycleState::Activating | LifecycleState::Active
        ) {
            return Err(OffgridError::InvalidState {
                expected: LifecycleState::Waiting.to_string(),
                actual: record.state.to_string(),
            });
        }

        let engine = self.engine(&version)?;

        record.transition(LifecycleState::Activating);
        self.records.save(&record).await?;

        let (deleted, retained) = self.collect_garbage().await;

        record.active_version = Some(version.clone());
        record.activated_at = Some(Utc::now());
        record.transition(LifecycleState::Active);
        self.records.save(&record).await?;

        let clients_claimed = self.clients.claim(engine);

        self.audit
            .record(AuditEvent::Activated {
                version: version.clone(),
                deleted: deleted.clone(),
                retained: retained.clone(),
                clients_claimed,
            })
            .await;
        info!(
            version = %version,
            deleted = deleted.len(),
            clients = clients_claimed,
            "Activated"
        );

        Ok(ActivateReport {
            version,
            deleted,
            retained,
            clients_claimed,
        })
    }

    /// Delete every managed partition from another version
    ///
    /// Returns the deleted names and the stale names whose deletion failed.
    async fn collect_garbage(&self) -> (Vec<String>, Vec<String>) {
        let names = match self.cache.list_partition_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %e, "Could not enumerate partitions, skipping garbage collection");
                return (vec![], vec![]);
            }
        };

        let mut deleted = Vec::new();
        let mut retained = Vec::new();
        for name in names.into_iter().filter(|n| self.partitions.is_stale(n)) {
            match self.cache.delete_partition(&name).await {
                Ok(_) => {
                    info!(partition = %name, "Deleted stale partition");
                    self.audit
                        .record(AuditEvent::PartitionDeleted {
                            partition: name.clone(),
                            active_version: self.version().to_string(),
                        })
                        .await;
                    deleted.push(name);
                }
                Err(e) => {
                    warn!(partition = %name, error = %e, "Failed to delete stale partition");
                    retained.push(name);
                }
            }
        }
        (deleted, retained)
    }

    /// Bring the configured version into service, resuming persisted state
    pub async fn boot(&self) -> OffgridResult<BootReport> {
        let version = self.version().to_string();
        let record = self.records.load().await?;

        if let Some(r) = &record {
            if r.is_active(&version) {
                let claimed = self.clients.claim(self.engine(&version)?);
                info!(version = %version, clients = claimed, "Resuming active version");
                return Ok(BootReport::Resumed { version });
            }
        }

        let already_waiting = record.as_ref().is_some_and(|r| {
            r.version == version
                && matches!(r.state, LifecycleState::Waiting | LifecycleState::Activating)
        });
        // Whatever served last stays the fallback, even when it is this version
        let last_active = record.and_then(|r| r.active_version);
        let previous = last_active.clone().filter(|v| *v != version);

        let install = if already_waiting {
            None
        } else {
            match self.on_install().await {
                Ok(report) => Some(report),
                Err(error) => {
                    let Some(serving) = last_active else {
                        return Err(error);
                    };
                    warn!(
                        version = %version,
                        serving = %serving,
                        error = %error,
                        "Install failed, previous version keeps serving"
                    );
                    self.clients.claim(self.engine(&serving)?);
                    return Ok(BootReport::KeptPrevious { serving, error });
                }
            }
        };

        if !self.config.lifecycle.skip_waiting {
            if let Some(serving) = previous {
                info!(version = %version, serving = %serving, "Installed version is waiting");
                self.clients.claim(self.engine(&serving)?);
                return Ok(BootReport::Waiting { install, serving });
            }
        }

        let activate = self.on_activate().await?;
        Ok(BootReport::Activated { install, activate })
    }
}
