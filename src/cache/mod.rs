//! Versioned cache partitions
//!
//! Partitions are named `<purpose>-<version>` and hold request→response
//! pairs. They are created lazily on first write, survive restarts, and are
//! only ever destroyed by the activation garbage-collection pass.
//!
//! | Purpose | Prefix | Filled by |
//! |---------|--------|-----------|
//! | Runtime | `runtime-cache-` | strategy executors |
//! | Precache | `precache-` | install |
//! | Fonts | `font-cache-` | install, font requests |
//! | Media | `media-cache-` | cross-origin CMS media requests |

pub mod entry;
pub mod manager;
pub mod memory;
pub mod partition;
pub mod store;

pub use entry::{EntryMeta, RequestKey, StoredResponse};
pub use manager::{CacheManager, Partition};
pub use memory::MemoryStore;
pub use partition::{PartitionId, PartitionSet, Purpose};
pub use store::{CacheStore, FileStore};
