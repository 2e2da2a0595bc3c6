//! Error types for dexuse
//!
//! All modules use `DexUseResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dexuse operations
pub type DexUseResult<T> = Result<T, DexUseError>;

/// All errors that can occur in dexuse
#[derive(Error, Debug)]
pub enum DexUseError {
    // Caller contract errors
    #[error("loader ISA {isa} is unsupported")]
    UnsupportedIsa { isa: String },

    #[error("trying to change owner user for dex path {dex_path} from {existing} to {requested}")]
    OwnerMismatch {
        dex_path: String,
        existing: i32,
        requested: i32,
    },

    #[error("{kind} {key:?} cannot be stored in the usage file")]
    InvalidKey { kind: &'static str, key: String },

    // Usage file errors
    #[error("no version line found in usage file")]
    MissingHeader,

    #[error("invalid version line: {0}")]
    InvalidHeader(String),

    #[error("unexpected usage file version: {found} (expected {expected})")]
    VersionMismatch { found: i32, expected: i32 },

    #[error("malformed usage file at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl DexUseError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for a 1-based line number
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// True for errors that mean the stored usage file cannot be trusted
    pub fn is_corrupt_state(&self) -> bool {
        matches!(
            self,
            Self::MissingHeader
                | Self::InvalidHeader(_)
                | Self::VersionMismatch { .. }
                | Self::Parse { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        if self.is_corrupt_state() {
            return Some("Run: dexuse clear");
        }
        match self {
            Self::UnsupportedIsa { .. } => Some("Check [isa] supported_abis in the config file"),
            Self::ConfigInvalid { .. } => Some("Run: dexuse config init --force"),
            _ => None,
        }
    }
}
