//! Appearance events published to subscribers.
//!
//! Events are produced on the main context after a mutation has been applied.
//! Subscribers observe outcomes here; the request APIs never fail.

use crate::bake::{BakeRegion, Fingerprint};
use serde::{Deserialize, Serialize};
use std::fmt;
use wardrobe_core::{AssetId, WearableType};

/// Identifier of one outfit request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Event type discriminator
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Contents of a wearable type changed
    WearableChanged = 0,
    /// An outfit request finished composing
    OutfitComposed = 1,
    /// A wearable asset could not be fetched
    WearableMissing = 2,
    /// A region fingerprint changed
    FingerprintChanged = 3,
}

/// Events emitted by the appearance engine
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppearanceEvent {
    /// The items worn for a type changed
    WearableChanged {
        /// Type that changed
        wearable_type: WearableType,
    },

    /// An outfit request was applied to the store
    OutfitComposed {
        /// The request
        request_id: RequestId,
        /// Types whose contents changed
        changed_types: Vec<WearableType>,
        /// Entries that fell back to a default wearable
        recovered: usize,
        /// Entries that were refused (full slots, unknown items)
        refused: usize,
    },

    /// A worn asset was missing and replaced by a default
    WearableMissing {
        /// Type of the missing wearable
        wearable_type: WearableType,
        /// Layer index the default was placed at
        index: usize,
        /// Asset that could not be fetched
        asset_id: AssetId,
    },

    /// The fingerprint of a baked region changed
    FingerprintChanged {
        /// The region
        region: BakeRegion,
        /// New fingerprint (null when nothing contributes)
        fingerprint: Fingerprint,
    },
}

impl AppearanceEvent {
    /// Returns the event type
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::WearableChanged { .. } => EventType::WearableChanged,
            Self::OutfitComposed { .. } => EventType::OutfitComposed,
            Self::WearableMissing { .. } => EventType::WearableMissing,
            Self::FingerprintChanged { .. } => EventType::FingerprintChanged,
        }
    }

    /// Wearable type concerned by this event (if any)
    #[must_use]
    pub const fn wearable_type(&self) -> Option<WearableType> {
        match self {
            Self::WearableChanged { wearable_type } | Self::WearableMissing { wearable_type, .. } => {
                Some(*wearable_type)
            }
            Self::OutfitComposed { .. } | Self::FingerprintChanged { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = AppearanceEvent::WearableChanged {
            wearable_type: WearableType::Shirt,
        };
        assert_eq!(event.event_type(), EventType::WearableChanged);
        assert_eq!(event.wearable_type(), Some(WearableType::Shirt));
    }

    #[test]
    fn test_fingerprint_event_has_no_type() {
        let event = AppearanceEvent::FingerprintChanged {
            region: BakeRegion::Hair,
            fingerprint: Fingerprint::NULL,
        };
        assert_eq!(event.event_type(), EventType::FingerprintChanged);
        assert_eq!(event.wearable_type(), None);
    }
}
