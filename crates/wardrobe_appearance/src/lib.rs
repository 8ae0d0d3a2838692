//! # WARDROBE Appearance
//!
//! Turns outfit requests into worn wearables.
//!
//! ## Pipeline
//!
//! 1. [`OutfitResolver`] fans out one asset fetch per entry and collects the
//!    results, whatever order they arrive in.
//! 2. [`AppearanceComposer`] applies the resolved batch to the
//!    [`WearableStore`](wardrobe_core::WearableStore) under the layering and
//!    exclusivity rules.
//! 3. [`fingerprint`] derives the bake cache key of every affected region and
//!    [`BakeCacheTracker`] turns them into cache queries.
//!
//! Nothing in this crate performs I/O. Asset fetching, inventory lookups and
//! notifications go through the traits in [`collaborators`].

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bake_cache;
pub mod collaborators;
pub mod composer;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod ordering;
pub mod resolver;

pub use bake_cache::{BakeCacheTracker, CacheQuery, CacheResponse, CacheResponseEntry, CacheVerdict};
pub use collaborators::{
    AssetData, AssetFetchError, AssetStore, CreatedItem, InventoryIndex, InventoryWriter, ItemRecord,
    NewItemRequest, NotificationPayload, NotificationSink, SystemFolder,
};
pub use composer::{AppearanceComposer, CompositionReport, RecoveryAction, RefusedEntry};
pub use config::{ExclusivityPolicy, ResolverConfig};
pub use error::{AppearanceError, AppearanceResult};
pub use fingerprint::{compute_fingerprint, compute_poisoned_fingerprint, RegionFingerprints};
pub use resolver::{
    CancellationToken, FetchCompletion, OutfitEntry, OutfitResolver, RequestState, ResolvedEntry,
    ResolvedOutfit,
};
