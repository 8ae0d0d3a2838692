//! # External Collaborators
//!
//! Contracts for the subsystems this crate talks to but does not own: the
//! asset store, inventory lookups and writes, and the user notification
//! sink.

use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;
use wardrobe_core::{AssetId, ItemId, WearableType};

use crate::resolver::FetchCompletion;

/// A fetched wearable asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetData {
    /// Asset id.
    pub asset_id: AssetId,
    /// Type recorded in the asset itself.
    pub wearable_type: WearableType,
    /// Name recorded in the asset.
    pub name: String,
}

/// Why an asset fetch failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetFetchError {
    /// The asset does not exist. Never retried.
    #[error("asset not found")]
    NotFound,

    /// Temporary failure (network, busy server).
    #[error("transient failure: {0}")]
    Transient(String),

    /// The completion handle was dropped without a result.
    #[error("fetch abandoned")]
    Abandoned,

    /// No result arrived before the request deadline.
    #[error("timed out")]
    TimedOut,
}

impl AssetFetchError {
    /// Returns true if another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Abandoned)
    }
}

/// Asynchronous wearable asset source.
///
/// Implementations must call [`FetchCompletion::complete`] at most once,
/// from any thread. The handle reports [`AssetFetchError::Abandoned`] if it
/// is dropped first.
pub trait AssetStore {
    /// Starts fetching `asset_id`.
    fn fetch_asset(
        &mut self,
        asset_id: AssetId,
        wearable_type: WearableType,
        completion: FetchCompletion,
    );
}

/// An inventory record, as seen by the appearance engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemRecord {
    /// Item id.
    pub item_id: ItemId,
    /// Asset the item points at.
    pub asset_id: AssetId,
    /// Target item when this record is a link.
    pub linked_item_id: Option<ItemId>,
    /// Wearable type, `None` for non-wearables.
    pub wearable_type: Option<WearableType>,
    /// Display name.
    pub name: String,
    /// Description (carries the layer order marker).
    pub description: String,
    /// Owning agent.
    pub owner_id: Uuid,
}

/// Read-only lookup into the inventory.
pub trait InventoryIndex {
    /// Looks an item up.
    fn get_item(&self, item_id: ItemId) -> Option<ItemRecord>;

    /// Resolves a link to the item it points at; other items map to
    /// themselves.
    fn resolve_link(&self, item_id: ItemId) -> ItemId {
        self.get_item(item_id)
            .and_then(|record| record.linked_item_id)
            .unwrap_or(item_id)
    }
}

/// Inventory folders the engine files new items into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemFolder {
    /// Where recovered wearables end up.
    LostAndFound,
}

/// A wearable to save as a new asset and inventory item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewItemRequest {
    /// Type of the wearable.
    pub wearable_type: WearableType,
    /// Name of the new item.
    pub name: String,
    /// Destination folder.
    pub folder: SystemFolder,
}

/// Ids of a freshly created item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreatedItem {
    /// New inventory item.
    pub item_id: ItemId,
    /// Asset the wearable was saved as.
    pub asset_id: AssetId,
}

/// Write access to the inventory.
pub trait InventoryWriter {
    /// Saves a default wearable of `request.wearable_type` and creates an
    /// item for it. `None` if the item could not be created.
    fn create_item(&mut self, request: NewItemRequest) -> Option<CreatedItem>;
}

/// Key/value payload attached to a notification.
pub type NotificationPayload = BTreeMap<String, String>;

/// User-facing notification sink.
pub trait NotificationSink {
    /// Raises the notification `template_id`.
    fn add(&mut self, template_id: &str, payload: NotificationPayload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Inventory(HashMap<ItemId, ItemRecord>);

    impl InventoryIndex for Inventory {
        fn get_item(&self, item_id: ItemId) -> Option<ItemRecord> {
            self.0.get(&item_id).cloned()
        }
    }

    fn record(item_id: ItemId, linked: Option<ItemId>) -> ItemRecord {
        ItemRecord {
            item_id,
            asset_id: AssetId::generate(),
            linked_item_id: linked,
            wearable_type: Some(WearableType::Shirt),
            name: "Tee".into(),
            description: String::new(),
            owner_id: Uuid::nil(),
        }
    }

    #[test]
    fn test_resolve_link() {
        let base = ItemId::generate();
        let link = ItemId::generate();
        let stranger = ItemId::generate();
        let inventory = Inventory(HashMap::from([
            (base, record(base, None)),
            (link, record(link, Some(base))),
        ]));
        assert_eq!(inventory.resolve_link(link), base);
        assert_eq!(inventory.resolve_link(base), base);
        assert_eq!(inventory.resolve_link(stranger), stranger);
    }

    #[test]
    fn test_retryable() {
        assert!(AssetFetchError::Transient("busy".into()).is_retryable());
        assert!(AssetFetchError::Abandoned.is_retryable());
        assert!(!AssetFetchError::NotFound.is_retryable());
        assert!(!AssetFetchError::TimedOut.is_retryable());
    }
}
