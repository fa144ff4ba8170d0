//! Partition storage backends
//!
//! On disk each partition is a directory under the cache root. An entry is a
//! single `<digest>.entry` file: one line of JSON metadata, a newline, then
//! the body. The whole record is written to a temp file and renamed into
//! place, so concurrent writers of the same key replace each other whole and
//! a reader sees either the old record or the new one.

use crate::cache::entry::{EntryMeta, RequestKey, StoredResponse};
use crate::error::{OffgridError, OffgridResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const ENTRY_EXTENSION: &str = "entry";

/// Persistent key-value storage grouped into named partitions
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the partition if absent
    async fn open(&self, partition: &str) -> OffgridResult<()>;

    /// Read an entry
    async fn get(&self, partition: &str, key: &RequestKey)
        -> OffgridResult<Option<StoredResponse>>;

    /// Write an entry, replacing any previous one with the same key
    async fn put(&self, partition: &str, entry: &StoredResponse) -> OffgridResult<()>;

    /// Remove a partition and everything in it; returns whether it existed
    async fn delete_partition(&self, partition: &str) -> OffgridResult<bool>;

    /// Names of all persisted partitions, sorted
    async fn list_partitions(&self) -> OffgridResult<Vec<String>>;

    /// Metadata of every entry in a partition, sorted by key
    async fn entries(&self, partition: &str) -> OffgridResult<Vec<EntryMeta>>;
}

/// Reject names that cannot be used as a single path component
pub fn validate_partition_name(name: &str) -> OffgridResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(OffgridError::InvalidPartitionName(name.to_string()))
    }
}

/// File-backed store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, partition: &str) -> OffgridResult<PathBuf> {
        validate_partition_name(partition)?;
        Ok(self.root.join(partition))
    }

    fn entry_path(dir: &Path, key: &RequestKey) -> PathBuf {
        dir.join(format!("{}.{}", key.digest(), ENTRY_EXTENSION))
    }

    fn encode(entry: &StoredResponse) -> OffgridResult<Vec<u8>> {
        let mut record = serde_json::to_vec(&entry.meta)?;
        record.reserve(entry.body.len() + 1);
        record.push(b'\n');
        record.extend_from_slice(&entry.body);
        Ok(record)
    }

    /// Split a record into metadata and body; `None` when the header is incomplete
    fn decode(record: Vec<u8>) -> Option<Result<StoredResponse, serde_json::Error>> {
        let split = record.iter().position(|b| *b == b'\n')?;
        let mut record = Bytes::from(record);
        let header = record.split_to(split);
        let body = record.split_off(1);
        Some(serde_json::from_slice::<EntryMeta>(&header).map(|meta| StoredResponse { meta, body }))
    }

    async fn write_atomic(dir: &Path, target: &Path, contents: &[u8]) -> std::io::Result<()> {
        let tmp = dir.join(format!(".tmp-{}", Uuid::new_v4()));
        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        Ok(())
    }

    /// Read a file, mapping absence to `None`
    async fn read_optional(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn open(&self, partition: &str) -> OffgridResult<()> {
        let dir = self.partition_dir(partition)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| OffgridError::storage(partition, e))
    }

    async fn get(
        &self,
        partition: &str,
        key: &RequestKey,
    ) -> OffgridResult<Option<StoredResponse>> {
        let dir = self.partition_dir(partition)?;

        let Some(record) = Self::read_optional(&Self::entry_path(&dir, key))
            .await
            .map_err(|e| OffgridError::storage(partition, e))?
        else {
            return Ok(None);
        };

        let entry = match Self::decode(record) {
            Some(Ok(entry)) => entry,
            Some(Err(e)) => {
                return Err(OffgridError::storage(partition, format!("corrupt metadata: {}", e)))
            }
            None => {
                debug!(partition, key = %key, "Truncated entry, treating as miss");
                return Ok(None);
            }
        };

        if entry.meta.key != *key {
            warn!(partition, key = %key, stored = %entry.meta.key, "Key digest collision");
            return Ok(None);
        }

        if !entry.verify() {
            debug!(partition, key = %key, "Entry body does not match metadata, treating as miss");
            return Ok(None);
        }

        Ok(Some(entry))
    }

    async fn put(&self, partition: &str, entry: &StoredResponse) -> OffgridResult<()> {
        let dir = self.partition_dir(partition)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| OffgridError::storage(partition, e))?;

        let record = Self::encode(entry)?;
        Self::write_atomic(&dir, &Self::entry_path(&dir, &entry.meta.key), &record)
            .await
            .map_err(|e| OffgridError::storage(partition, e))
    }

    async fn delete_partition(&self, partition: &str) -> OffgridResult<bool> {
        let dir = self.partition_dir(partition)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(OffgridError::storage(partition, e)),
        }
    }

    async fn list_partitions(&self) -> OffgridResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(OffgridError::io("reading cache root", e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| OffgridError::io("reading cache root entry", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_partition_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn entries(&self, partition: &str) -> OffgridResult<Vec<EntryMeta>> {
        let dir = self.partition_dir(partition)?;
        let mut listing = match fs::read_dir(&dir).await {
            Ok(listing) => listing,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(OffgridError::storage(partition, e)),
        };

        let mut metas = Vec::new();
        while let Some(entry) = listing
            .next_entry()
            .await
            .map_err(|e| OffgridError::storage(partition, e))?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != ENTRY_EXTENSION) {
                continue;
            }
            match fs::read(&path).await {
                Ok(record) => match Self::decode(record) {
                    Some(Ok(entry)) => metas.push(entry.meta),
                    Some(Err(e)) => {
                        warn!(path = %path.display(), error = %e, "Skipping corrupt metadata")
                    }
                    None => warn!(path = %path.display(), "Skipping truncated entry"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }

        metas.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(metas)
    }
}
