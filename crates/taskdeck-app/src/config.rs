//! Project configuration loaded from `taskdeck.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const CONFIG_FILE: &str = "taskdeck.toml";

/// Top-level configuration. A missing file yields the defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Store settings.
    #[serde(default)]
    pub store: StoreSettings,
}

/// The `[store]` table.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreSettings {
    /// Location of the store file. Relative paths resolve against the
    /// directory the config was loaded from.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Optional cap on the serialized store size, in bytes.
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

impl ProjectConfig {
    /// Load configuration from `<dir>/taskdeck.toml`, falling back to the
    /// defaults when the file does not exist.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = dir.as_ref().join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        Ok(config)
    }
}
