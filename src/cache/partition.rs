//! Partition identity and versioned naming
//!
//! Every partition name is `<purpose prefix>-<version>`. Garbage collection
//! relies on parsing names back into a [`PartitionId`], so names that do not
//! match a known prefix are never treated as stale.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical purpose of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    /// Responses cached on demand while handling requests
    Runtime,
    /// Manifest entries written at install
    Precache,
    /// Font assets
    Fonts,
    /// Third-party CMS media
    Media,
}

impl Purpose {
    pub const ALL: [Purpose; 4] = [
        Purpose::Runtime,
        Purpose::Precache,
        Purpose::Fonts,
        Purpose::Media,
    ];

    /// Name prefix shared by every version of this purpose
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Runtime => "runtime-cache",
            Self::Precache => "precache",
            Self::Fonts => "font-cache",
            Self::Media => "media-cache",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::Precache => write!(f, "precache"),
            Self::Fonts => write!(f, "fonts"),
            Self::Media => write!(f, "media"),
        }
    }
}

/// A versioned partition identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionId {
    pub purpose: Purpose,
    pub version: String,
}

impl PartitionId {
    pub fn new(purpose: Purpose, version: impl Into<String>) -> Self {
        Self {
            purpose,
            version: version.into(),
        }
    }

    /// Persisted partition name
    pub fn name(&self) -> String {
        format!("{}-{}", self.purpose.prefix(), self.version)
    }

    /// Parse a persisted name back into an id
    pub fn parse(name: &str) -> Option<Self> {
        Purpose::ALL.iter().find_map(|purpose| {
            name.strip_prefix(purpose.prefix())
                .and_then(|rest| rest.strip_prefix('-'))
                .filter(|version| !version.is_empty())
                .map(|version| Self::new(*purpose, version))
        })
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.purpose.prefix(), self.version)
    }
}

/// The partitions belonging to one deployed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    version: String,
}

impl PartitionSet {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn id(&self, purpose: Purpose) -> PartitionId {
        PartitionId::new(purpose, self.version.clone())
    }

    pub fn runtime(&self) -> PartitionId {
        self.id(Purpose::Runtime)
    }

    pub fn precache(&self) -> PartitionId {
        self.id(Purpose::Precache)
    }

    pub fn fonts(&self) -> PartitionId {
        self.id(Purpose::Fonts)
    }

    pub fn media(&self) -> PartitionId {
        self.id(Purpose::Media)
    }

    /// Whether the name belongs to this version
    pub fn owns(&self, name: &str) -> bool {
        PartitionId::parse(name).is_some_and(|id| id.version == self.version)
    }

    /// Whether the name is a managed partition from another version
    pub fn is_stale(&self, name: &str) -> bool {
        PartitionId::parse(name).is_some_and(|id| id.version != self.version)
    }
}
