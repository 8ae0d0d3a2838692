//! # Worn Item
//!
//! One asset occupying one slot.

use crate::ids::{AssetId, ItemId};
use crate::wearable::types::WearableType;
use serde::{Deserialize, Serialize};

/// A wearable asset currently placed in a slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WornItem {
    /// Content identity of the asset.
    pub asset_id: AssetId,
    /// Inventory record this item was worn from (lookup only).
    pub item_id: ItemId,
    /// Category of the asset.
    pub wearable_type: WearableType,
    /// Display name.
    pub name: String,
    /// Local edits that have not been saved yet.
    pub dirty: bool,
}

impl WornItem {
    /// Creates a clean worn item.
    #[must_use]
    pub fn new(
        wearable_type: WearableType,
        asset_id: AssetId,
        item_id: ItemId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            asset_id,
            item_id,
            wearable_type,
            name: name.into(),
            dirty: false,
        }
    }

    /// Default wearable synthesized when the real asset could not be fetched.
    ///
    /// It has no asset yet and is dirty until the caller saves it. The
    /// inventory link is left null; callers replacing a known item set it.
    #[must_use]
    pub fn synthesized_default(wearable_type: WearableType) -> Self {
        Self {
            asset_id: AssetId::NULL,
            item_id: ItemId::NULL,
            wearable_type,
            name: wearable_type.default_new_name().to_owned(),
            dirty: true,
        }
    }

    /// Returns true for items produced by [`WornItem::synthesized_default`]
    /// that have not been saved as a real asset.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.asset_id.is_null()
    }

    /// Flags unsaved local edits.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the unsaved flag after a save.
    #[inline]
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
