use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Identifier of one dataset slot, e.g. `"v1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetKey(String);

impl DatasetKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// On-disk metadata layout of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Potree 1.x, described by `cloud.js`.
    V1,
    /// Potree 2.0, described by `metadata.json`.
    V2,
}

/// Where a dataset's metadata lives and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub file: String,
    pub url: String,
    pub format: SourceFormat,
}

impl SourceDescriptor {
    pub fn new(file: impl Into<String>, url: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            file: file.into(),
            url: url.into(),
            format,
        }
    }

    /// Remote locations are rejected by the file loader.
    pub fn is_remote(&self) -> bool {
        let url = self.url.trim_start();
        url.starts_with("http://") || url.starts_with("https://")
    }
}

/// One configured dataset slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub key: DatasetKey,
    #[serde(flatten)]
    pub source: SourceDescriptor,
}

/// The fixed set of dataset slots, in display order.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetCatalog {
    entries: Vec<CatalogEntry>,
}

impl DatasetCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The two Potree lion scans, one per metadata format.
    pub fn builtin() -> Self {
        Self::new(vec![
            CatalogEntry {
                key: DatasetKey::new("v1"),
                source: SourceDescriptor::new("cloud.js", "lion_takanawa/", SourceFormat::V1),
            },
            CatalogEntry {
                key: DatasetKey::new("v2"),
                source: SourceDescriptor::new(
                    "metadata.json",
                    "lion_takanawa_converted/",
                    SourceFormat::V2,
                ),
            },
        ])
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &DatasetKey> {
        self.entries.iter().map(|entry| &entry.key)
    }

    pub fn source(&self, key: &DatasetKey) -> Option<&SourceDescriptor> {
        self.entries
            .iter()
            .find(|entry| &entry.key == key)
            .map(|entry| &entry.source)
    }

    pub fn contains(&self, key: &DatasetKey) -> bool {
        self.source(key).is_some()
    }

    /// Key at a zero-based display position (used by number-key shortcuts).
    pub fn key_at(&self, index: usize) -> Option<&DatasetKey> {
        self.entries.get(index).map(|entry| &entry.key)
    }
}
