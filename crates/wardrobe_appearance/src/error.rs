//! # Appearance Error Types
//!
//! Errors detected while resolving and composing outfits. They are handled
//! where they are detected; none of them fails an outfit request.

use thiserror::Error;
use wardrobe_core::{AssetId, ItemId, StoreError, WearableType};
use wardrobe_shared::RequestId;

use crate::collaborators::AssetFetchError;

/// Errors that can occur in the appearance system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppearanceError {
    /// An asset in a batch could not be resolved.
    #[error("asset {asset_id} could not be fetched: {reason}")]
    AssetFetchFailed {
        /// The asset.
        asset_id: AssetId,
        /// Why the fetch failed.
        reason: AssetFetchError,
    },

    /// A wire record named a wearable type outside the known range.
    #[error("invalid wearable type index {0}")]
    InvalidTypeIndex(u8),

    /// A completion arrived for a request that is no longer active.
    #[error("stale completion for request {0}")]
    StaleRequest(RequestId),

    /// A cache response named a baked texture index no region uses.
    #[error("unknown baked texture index {0}")]
    UnknownTextureIndex(u8),

    /// An item is not known to the inventory.
    #[error("item {0} not found in inventory")]
    UnknownItem(ItemId),

    /// The inventory record points at another asset than the request.
    #[error("item {item_id} now points at asset {recorded}, request named {requested}")]
    AssetMismatch {
        /// The item.
        item_id: ItemId,
        /// Asset named by the request.
        requested: AssetId,
        /// Asset recorded in the inventory.
        recorded: AssetId,
    },

    /// The fetched asset is of another type than requested.
    #[error("asset {asset_id} is a {actual}, expected {expected}")]
    TypeMismatch {
        /// The asset.
        asset_id: AssetId,
        /// Type the outfit entry asked for.
        expected: WearableType,
        /// Type of the fetched asset.
        actual: WearableType,
    },

    /// The wearable store refused a mutation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for appearance operations.
pub type AppearanceResult<T> = Result<T, AppearanceError>;
