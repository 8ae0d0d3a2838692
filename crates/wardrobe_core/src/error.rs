//! # Store Error Types
//!
//! Refusals reported by the wearable store. None of them are fatal: the
//! store is left unchanged when one is returned.

use crate::ids::ItemId;
use crate::wearable::WearableType;
use thiserror::Error;

/// Errors returned by [`crate::WearableStore`] mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The type already holds as many items as it may.
    #[error("slot full: {wearable_type} already holds {capacity} item(s)")]
    SlotFull {
        /// Type that was full.
        wearable_type: WearableType,
        /// Its capacity.
        capacity: usize,
    },

    /// No item at the given position.
    #[error("invalid index {index} for {wearable_type} (count {count})")]
    InvalidIndex {
        /// Type addressed.
        wearable_type: WearableType,
        /// Requested index.
        index: usize,
        /// Number of items currently worn in that type.
        count: usize,
    },

    /// The item's own type does not match the slot it was offered to.
    #[error("type mismatch: {item_type} item offered to {slot_type} slot")]
    TypeMismatch {
        /// Slot type.
        slot_type: WearableType,
        /// Type carried by the item.
        item_type: WearableType,
    },

    /// Removing this body part would leave the avatar without one.
    #[error("{0} must always be worn")]
    BodyPartRequired(WearableType),

    /// The inventory item is already worn in this type.
    #[error("item {item_id} is already worn as {wearable_type}")]
    AlreadyWorn {
        /// Type it is worn as.
        wearable_type: WearableType,
        /// The inventory item.
        item_id: ItemId,
    },

    /// No worn item references this inventory item.
    #[error("item {0} is not worn")]
    NotWorn(ItemId),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
