//! Cache store manager
//!
//! Wraps a [`CacheStore`] with the semantics the engine relies on: only
//! successful GET responses are stored, write failures on request paths are
//! logged and swallowed, and read failures behave as misses.

use crate::cache::entry::{EntryMeta, RequestKey, StoredResponse};
use crate::cache::memory::MemoryStore;
use crate::cache::partition::PartitionId;
use crate::cache::store::{validate_partition_name, CacheStore, FileStore};
use crate::config::schema::StorageKind;
use crate::config::{Config, ConfigManager};
use crate::error::OffgridResult;
use crate::fetch::{FetchRequest, FetchResponse};
use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns partition creation, lookup and deletion
#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Build the manager for the configured storage backend
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn CacheStore> = match config.cache.storage {
            StorageKind::File => Arc::new(FileStore::new(ConfigManager::cache_dir(config))),
            StorageKind::Memory => Arc::new(MemoryStore::new()),
        };
        Self::new(store)
    }

    /// Open a partition, creating it if absent
    pub async fn open(&self, id: &PartitionId) -> OffgridResult<Partition> {
        let partition = self.partition(id);
        self.store.open(&partition.name).await?;
        Ok(partition)
    }

    /// Handle to a partition; storage is created lazily on first write
    pub fn partition(&self, id: &PartitionId) -> Partition {
        Partition {
            name: id.name(),
            store: self.store.clone(),
        }
    }

    /// Handle to a partition by raw name, for inspection
    pub fn named(&self, name: &str) -> OffgridResult<Partition> {
        validate_partition_name(name)?;
        Ok(Partition {
            name: name.to_string(),
            store: self.store.clone(),
        })
    }

    /// Irreversibly delete a partition
    pub async fn delete_partition(&self, name: &str) -> OffgridResult<bool> {
        self.store.delete_partition(name).await
    }

    /// Names of every persisted partition
    pub async fn list_partition_names(&self) -> OffgridResult<Vec<String>> {
        self.store.list_partitions().await
    }
}

/// A named partition bound to its backing store
#[derive(Clone)]
pub struct Partition {
    name: String,
    store: Arc<dyn CacheStore>,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a response; any read failure is a miss
    pub async fn lookup(&self, request: &FetchRequest) -> Option<FetchResponse> {
        self.lookup_entry(request)
            .await
            .map(|entry| entry.to_response())
    }

    /// Look up the stored entry with its metadata
    pub async fn lookup_entry(&self, request: &FetchRequest) -> Option<StoredResponse> {
        if !request.is_get() {
            return None;
        }

        let key = RequestKey::from_request(request);
        match self.store.get(&self.name, &key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(partition = %self.name, key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a response, surfacing write errors
    ///
    /// Returns `false` without writing when the request is not a GET or the
    /// response status is not 200.
    pub async fn try_put(
        &self,
        request: &FetchRequest,
        response: &FetchResponse,
    ) -> OffgridResult<bool> {
        if !request.is_get() || response.status != StatusCode::OK {
            debug!(
                partition = %self.name,
                url = %request.url,
                status = %response.status,
                "Skipping uncacheable response"
            );
            return Ok(false);
        }

        let entry = StoredResponse::capture(RequestKey::from_request(request), response);
        self.store.put(&self.name, &entry).await?;
        debug!(partition = %self.name, key = %entry.meta.key, "Stored response");
        Ok(true)
    }

    /// Best-effort store; failures are logged and reported as `false`
    pub async fn put(&self, request: &FetchRequest, response: &FetchResponse) -> bool {
        match self.try_put(request, response).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(partition = %self.name, url = %request.url, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Metadata of every entry, sorted by key
    pub async fn entries(&self) -> OffgridResult<Vec<EntryMeta>> {
        self.store.entries(&self.name).await
    }
}
