//! File backend configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

static DEFAULT_DATA_DIR: &str = "~/.local/share/datefinder";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

/// Backend configuration at ~/.config/datefinder/store-file.toml
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: default_data_dir(),
        }
    }
}

impl StoreConfig {
    pub fn load() -> Result<Self> {
        let path = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("datefinder/store-file.toml");

        if !path.exists() {
            return Ok(StoreConfig::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// The data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }
}
