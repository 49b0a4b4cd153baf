//! Device-local identity binding.
//!
//! The participant id/name pair chosen on this device, persisted across
//! sessions in the platform config directory. Loaded and saved explicitly by
//! the caller and injected where needed; the engine never reads it ad hoc.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DateFinderError, DateFinderResult};

const IDENTITY_FILE: &str = "identity.toml";

/// The identity this device acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalIdentity {
    pub id: String,
    pub name: String,
}

impl LocalIdentity {
    fn path() -> DateFinderResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DateFinderError::Config("Could not determine config directory".into()))?
            .join("datefinder");

        Ok(config_dir.join(IDENTITY_FILE))
    }

    /// Load the stored identity; `None` on a first visit.
    pub fn load() -> DateFinderResult<Option<Self>> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let identity: LocalIdentity =
            toml::from_str(&content).map_err(|e| DateFinderError::Config(e.to_string()))?;
        Ok(Some(identity))
    }

    /// Persist (or overwrite) the identity binding.
    pub fn save(&self) -> DateFinderResult<()> {
        let path = Self::path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| DateFinderError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}
