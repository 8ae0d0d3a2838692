//! Wearable types and worn items.

mod item;
mod types;

pub use item::WornItem;
pub use types::{AssetClass, WearableType, MAX_PER_TYPE};
