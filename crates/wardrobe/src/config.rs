//! # Session Configuration
//!
//! Loaded once when the session starts. Every section is optional:
//!
//! ```toml
//! [exclusivity]
//! no_multiple_shoes = true
//!
//! [resolver]
//! timeout_ms = 30000
//! max_fetch_retries = 3
//!
//! [attachments]
//! objects_per_packet = 4
//! max_packets = 10
//!
//! [events]
//! capacity = 1024
//! ```

use std::path::Path;

use serde::Deserialize;
use wardrobe_appearance::{ExclusivityPolicy, ResolverConfig};
use wardrobe_networking::BatcherConfig;
use wardrobe_shared::constants::MAX_OBJECTS_PER_REQUEST;

use crate::error::{ConfigError, ConfigResult};

/// Event bus settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Events buffered before new ones are dropped.
    pub capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Complete engine configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppearanceConfig {
    /// Single-instance clothing rules.
    pub exclusivity: ExclusivityPolicy,
    /// Outfit resolver timeout and retries.
    pub resolver: ResolverConfig,
    /// Attachment batching limits.
    pub attachments: BatcherConfig,
    /// Event bus.
    pub events: EventConfig,
}

impl AppearanceConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed input or unknown keys,
    /// [`ConfigError::Invalid`] for out of range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "appearance config loaded");
        Ok(config)
    }

    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.attachments.objects_per_packet == 0 {
            return Err(ConfigError::Invalid {
                field: "attachments.objects_per_packet",
                reason: "must be at least 1",
            });
        }
        if self.attachments.max_packets == 0 {
            return Err(ConfigError::Invalid {
                field: "attachments.max_packets",
                reason: "must be at least 1",
            });
        }
        if self.attachments.capacity() > MAX_OBJECTS_PER_REQUEST {
            return Err(ConfigError::Invalid {
                field: "attachments",
                reason: "objects_per_packet * max_packets must not exceed 255",
            });
        }
        if self.events.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "events.capacity",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
