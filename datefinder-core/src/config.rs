//! Global datefinder configuration.

use std::path::PathBuf;

use config::{Config, File};
use serde::Deserialize;

use crate::error::{DateFinderError, DateFinderResult};

static DEFAULT_STORE: &str = "file";

fn default_store() -> String {
    DEFAULT_STORE.to_string()
}

/// Global configuration at ~/.config/datefinder/config.toml
///
/// Store-backend-specific settings (e.g. the file backend's data directory)
/// live in the backend's own config file instead.
#[derive(Deserialize, Clone)]
pub struct GlobalConfig {
    /// Which store backend to speak to (`datefinder-store-<name>` on PATH).
    #[serde(default = "default_store")]
    pub store: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            store: default_store(),
        }
    }
}

impl GlobalConfig {
    pub fn config_path() -> DateFinderResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DateFinderError::Config("Could not determine config directory".into()))?
            .join("datefinder");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> DateFinderResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        Config::builder()
            .add_source(File::from(config_path).required(false))
            .build()
            .map_err(|e| DateFinderError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DateFinderError::Config(e.to_string()))
    }
}
