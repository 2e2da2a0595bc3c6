//! Configuration schema for dexuse
//!
//! Configuration is stored at `~/.config/dexuse/config.toml`

use crate::isa::{host_abis, IsaSet};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Usage file settings
    pub store: StoreConfig,

    /// Supported instruction sets
    pub isa: IsaConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Usage file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Usage file location (defaults to the state directory)
    pub path: Option<PathBuf>,

    /// Debounce window for background writes, in milliseconds
    pub write_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            write_delay_ms: 2000,
        }
    }
}

impl StoreConfig {
    /// Resolved usage file path
    pub fn file_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(super::ConfigManager::default_store_path)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }
}

/// Instruction set configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IsaConfig {
    /// ABI strings the device supports, e.g. "arm64-v8a"
    pub supported_abis: Vec<String>,
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self {
            supported_abis: host_abis(),
        }
    }
}

impl IsaConfig {
    /// Instruction set vocabulary for the configured ABIs
    pub fn vocabulary(&self) -> IsaSet {
        IsaSet::from_abis(&self.supported_abis)
    }
}
