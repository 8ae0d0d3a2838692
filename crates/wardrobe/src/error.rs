//! # Engine Error Types

use std::path::PathBuf;

use thiserror::Error;
use wardrobe_appearance::AppearanceError;
use wardrobe_networking::ProtocolError;

/// Errors returned by [`crate::AppearanceEngine`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Store or composition refusal.
    #[error(transparent)]
    Appearance(#[from] AppearanceError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<wardrobe_core::StoreError> for EngineError {
    fn from(err: wardrobe_core::StoreError) -> Self {
        Self::Appearance(AppearanceError::Store(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while loading [`crate::AppearanceConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted key.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
