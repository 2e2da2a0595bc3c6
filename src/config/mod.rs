//! Settings for the usage store: file location, write debounce, ISA
//! vocabulary and log output. Stored as TOML under the user config dir.

pub mod schema;

pub use schema::Config;

use crate::error::{DexUseError, DexUseResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Name of the usage file inside the state directory
pub const STORE_FILE_NAME: &str = "package-dex-usage.list";

/// Locates, reads and writes the dexuse settings file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the per-user settings file
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Manager for an explicit settings file (`--config`)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// `<config dir>/dexuse/config.toml`, or `./dexuse/config.toml` without a home
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dexuse")
            .join("config.toml")
    }

    /// Directory holding the usage file unless `store.path` says otherwise
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dexuse")
    }

    /// Where the usage file lives when `store.path` is unset
    pub fn default_store_path() -> PathBuf {
        Self::state_dir().join(STORE_FILE_NAME)
    }

    /// Read the settings. A missing file means built-in defaults: host ISAs,
    /// default write delay, usage file in the state directory.
    pub async fn load(&self) -> DexUseResult<Config> {
        if !self.config_path.exists() {
            debug!("No settings at {}, using defaults", self.config_path.display());
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Parse one settings file; TOML errors name the offending path
    pub async fn load_from_file(&self, path: &Path) -> DexUseResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DexUseError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| DexUseError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the settings, creating the parent directory (`config init`)
    pub async fn save(&self, config: &Config) -> DexUseResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            DexUseError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Settings written to {}", self.config_path.display());
        Ok(())
    }

    /// Create the directory that holds the settings file
    async fn ensure_config_dir(&self) -> DexUseResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DexUseError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Settings file this manager reads and writes
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
