use std::collections::HashSet;
use std::path::{Path, PathBuf};

use constants::path::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DEFAULT_DATA_ROOT};
use serde::{Deserialize, Serialize};

use crate::engine::assets::catalog::{CatalogEntry, DatasetCatalog, DatasetKey};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("dataset key `{0}` is configured more than once")]
    DuplicateKey(DatasetKey),
}

/// Viewer settings read from `viewer_config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Asset path prefix dataset URLs are resolved against.
    pub data_root: String,
    /// `tracing` filter handed to Bevy's log plugin.
    pub log_filter: String,
    /// Dataset slots, in keyboard shortcut order.
    pub datasets: Vec<CatalogEntry>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_root: DEFAULT_DATA_ROOT.to_string(),
            log_filter: "info,wgpu=warn,naga=warn".to_string(),
            datasets: DatasetCatalog::builtin().entries().to_vec(),
        }
    }
}

impl ViewerConfig {
    /// Read config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.datasets {
            if !seen.insert(&entry.key) {
                return Err(ConfigError::DuplicateKey(entry.key.clone()));
            }
        }
        Ok(())
    }

    pub fn catalog(&self) -> DatasetCatalog {
        DatasetCatalog::new(self.datasets.clone())
    }
}

/// Config path, honouring the `POINT_CLOUD_VIEWER_CONFIG` override.
pub fn resolve_config_path(override_path: Option<String>) -> PathBuf {
    override_path
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the viewer config, falling back to defaults on any error.
///
/// Runs before the log plugin is installed, so problems go to stderr.
pub fn load_viewer_config() -> ViewerConfig {
    let path = resolve_config_path(std::env::var(CONFIG_PATH_ENV).ok());
    match ViewerConfig::load(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}; using default viewer config");
            ViewerConfig::default()
        }
    }
}
