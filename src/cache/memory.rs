//! In-process store used when `cache.storage = "memory"`

use crate::cache::entry::{EntryMeta, RequestKey, StoredResponse};
use crate::cache::store::{validate_partition_name, CacheStore};
use crate::error::OffgridResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Partitions held in memory; lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<String, HashMap<RequestKey, StoredResponse>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, partition: &str) -> OffgridResult<()> {
        validate_partition_name(partition)?;
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default();
        Ok(())
    }

    async fn get(
        &self,
        partition: &str,
        key: &RequestKey,
    ) -> OffgridResult<Option<StoredResponse>> {
        Ok(self
            .partitions
            .read()
            .await
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, partition: &str, entry: &StoredResponse) -> OffgridResult<()> {
        validate_partition_name(partition)?;
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default()
            .insert(entry.meta.key.clone(), entry.clone());
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> OffgridResult<bool> {
        Ok(self.partitions.write().await.remove(partition).is_some())
    }

    async fn list_partitions(&self) -> OffgridResult<Vec<String>> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn entries(&self, partition: &str) -> OffgridResult<Vec<EntryMeta>> {
        let mut metas: Vec<EntryMeta> = self
            .partitions
            .read()
            .await
            .get(partition)
            .map(|entries| entries.values().map(|e| e.meta.clone()).collect())
            .unwrap_or_default();
        metas.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(metas)
    }
}
