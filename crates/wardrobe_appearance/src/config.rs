//! # Composition Settings
//!
//! Policy knobs read once per session. Every section has a `Default`, so a
//! config file only needs to list what it overrides.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wardrobe_core::WearableType;
use wardrobe_shared::constants::{DEFAULT_MAX_FETCH_RETRIES, DEFAULT_RESOLVER_TIMEOUT_MS};

/// Clothing categories restricted to a single layer.
///
/// Body parts are always single-instance; these flags only affect clothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusivityPolicy {
    /// Wearing shoes replaces the current pair.
    pub no_multiple_shoes: bool,
    /// Wearing a skirt replaces the current one.
    pub no_multiple_skirts: bool,
    /// Wearing physics replaces the current one.
    pub no_multiple_physics: bool,
}

impl Default for ExclusivityPolicy {
    fn default() -> Self {
        Self {
            no_multiple_shoes: false,
            no_multiple_skirts: false,
            no_multiple_physics: true,
        }
    }
}

impl ExclusivityPolicy {
    /// Returns true when `wearable_type` must be placed with a single-slot
    /// overwrite rather than stacked.
    #[must_use]
    pub const fn is_single_instance(&self, wearable_type: WearableType) -> bool {
        match wearable_type {
            WearableType::Shoes => self.no_multiple_shoes,
            WearableType::Skirt => self.no_multiple_skirts,
            WearableType::Physics => self.no_multiple_physics,
            other => other.is_body_part(),
        }
    }
}

/// Outfit resolver settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Time allowed for a whole outfit request, in milliseconds. 0 disables
    /// the timeout.
    pub timeout_ms: u64,
    /// Re-dispatches allowed per entry after a transient fetch failure.
    pub max_fetch_retries: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_RESOLVER_TIMEOUT_MS,
            max_fetch_retries: DEFAULT_MAX_FETCH_RETRIES,
        }
    }
}

impl ResolverConfig {
    /// Request timeout, `None` when disabled.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_parts_always_single() {
        let policy = ExclusivityPolicy {
            no_multiple_shoes: false,
            no_multiple_skirts: false,
            no_multiple_physics: false,
        };
        for t in WearableType::BODY_PARTS {
            assert!(policy.is_single_instance(t));
        }
        assert!(!policy.is_single_instance(WearableType::Physics));
        assert!(!policy.is_single_instance(WearableType::Shirt));
    }

    #[test]
    fn test_default_policy() {
        let policy = ExclusivityPolicy::default();
        assert!(policy.is_single_instance(WearableType::Physics));
        assert!(!policy.is_single_instance(WearableType::Shoes));
    }

    #[test]
    fn test_timeout_zero_disables() {
        let config = ResolverConfig {
            timeout_ms: 0,
            ..ResolverConfig::default()
        };
        assert_eq!(config.timeout(), None);
        assert_eq!(
            ResolverConfig::default().timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
