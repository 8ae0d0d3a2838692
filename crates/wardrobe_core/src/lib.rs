//! # WARDROBE Core
//!
//! The wearable slot model shared by every other WARDROBE crate:
//! - The fixed wearable type dictionary (body parts and clothing)
//! - Asset and inventory item identifiers
//! - [`WearableStore`], the per-avatar set of worn items
//!
//! ## Layering
//!
//! Within a type, index 0 is closest to the body. Body parts hold exactly
//! one item; clothing types stack up to [`MAX_PER_TYPE`] layers.
//!
//! ## Example
//!
//! ```rust
//! use wardrobe_core::{AssetId, ItemId, WearableStore, WearableType, WornItem};
//!
//! let mut store = WearableStore::new();
//! let shirt = WornItem::new(WearableType::Shirt, AssetId::generate(), ItemId::generate(), "Tee");
//! store.push(WearableType::Shirt, shirt).unwrap();
//! assert_eq!(store.count(WearableType::Shirt), 1);
//! assert_eq!(store.take_updates(), vec![WearableType::Shirt]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod ids;
pub mod store;
pub mod wearable;

pub use error::{StoreError, StoreResult};
pub use ids::{AssetId, ItemId};
pub use store::WearableStore;
pub use wearable::{AssetClass, WearableType, WornItem, MAX_PER_TYPE};
