//! # Appearance Engine
//!
//! One engine per avatar session. It owns the wearable store and drives
//! the outfit pipeline:
//!
//! ```text
//! request_wear_outfit ──> OutfitResolver ──(fetches)──> AssetStore
//!                               │
//!                     pump(now) │ all in, or deadline
//!                               v
//!                       AppearanceComposer ──> WearableStore
//!                               │
//!            events, recovery, fingerprints, cache query, wearables update
//! ```
//!
//! Every mutation ends in the same place: queued store notifications become
//! `WearableChanged` events, the affected regions are fingerprinted again,
//! and the server is told what is worn now.

use std::time::Instant;

use uuid::Uuid;
use wardrobe_appearance::ordering::{layer_order_updates, sort_by_layer_order, LayerOrderUpdate};
use wardrobe_appearance::{
    compute_fingerprint, compute_poisoned_fingerprint, AppearanceComposer, AssetStore,
    BakeCacheTracker, CacheResponse, CacheResponseEntry, CacheVerdict, CompositionReport,
    InventoryIndex, InventoryWriter, NewItemRequest, NotificationPayload, NotificationSink,
    OutfitEntry, OutfitResolver, RecoveryAction, RegionFingerprints, RequestState, SystemFolder,
};
use wardrobe_core::{ItemId, StoreError, WearableStore, WearableType, WornItem};
use wardrobe_networking::protocol::{
    CachedTextureRequest, CachedTextureResponse, InboundMessage, Opcode, PayloadReader,
    PayloadWriter, WearablesUpdate,
};
use wardrobe_networking::{
    batch_detach, now_wearing, parse_initial_wearables, AttachmentBatcher, AttachmentItem,
    MessagingChannel,
};
use wardrobe_shared::constants::OBJECTS_PER_DETACH;
use wardrobe_shared::notifications::{REPLACED_MISSING_WEARABLE, WEARABLE_SAVE};
use wardrobe_shared::{AppearanceEvent, BakeRegion, Fingerprint, RequestId};

use crate::config::AppearanceConfig;
use crate::error::EngineResult;
use crate::events::{EventBus, EventReceiver, EventSender};

/// The subsystems an engine talks to.
pub struct Collaborators {
    /// Wearable asset source.
    pub assets: Box<dyn AssetStore>,
    /// Inventory lookups.
    pub inventory: Box<dyn InventoryIndex>,
    /// Inventory item creation, used to save recovered wearables.
    pub inventory_writer: Box<dyn InventoryWriter>,
    /// Outbound reliable messages.
    pub channel: Box<dyn MessagingChannel>,
    /// User-facing notifications.
    pub notifications: Box<dyn NotificationSink>,
}

/// What an inbound message led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Login wearables were handed to the resolver.
    WearablesRequested(Option<RequestId>),
    /// A bake cache answer was classified.
    CacheVerdicts(Vec<CacheVerdict>),
}

/// Avatar appearance session.
pub struct AppearanceEngine {
    config: AppearanceConfig,
    avatar_id: Uuid,
    store: WearableStore,
    resolver: OutfitResolver,
    composer: AppearanceComposer,
    batcher: AttachmentBatcher,
    fingerprints: RegionFingerprints,
    bake_cache: BakeCacheTracker,
    writer: PayloadWriter,
    wearables_serial: Option<u32>,
    assets: Box<dyn AssetStore>,
    inventory: Box<dyn InventoryIndex>,
    inventory_writer: Box<dyn InventoryWriter>,
    channel: Box<dyn MessagingChannel>,
    notifications: Box<dyn NotificationSink>,
    bus: EventBus,
    events: EventSender,
}

impl AppearanceEngine {
    /// Creates an engine with an empty store. `avatar_id` salts poisoned
    /// fingerprints.
    #[must_use]
    pub fn new(config: AppearanceConfig, avatar_id: Uuid, collaborators: Collaborators) -> Self {
        let bus = EventBus::new(config.events.capacity);
        let events = bus.sender();
        tracing::info!(%avatar_id, "appearance engine created");
        Self {
            avatar_id,
            store: WearableStore::new(),
            resolver: OutfitResolver::new(config.resolver),
            composer: AppearanceComposer::new(config.exclusivity),
            batcher: AttachmentBatcher::new(config.attachments),
            fingerprints: RegionFingerprints::default(),
            bake_cache: BakeCacheTracker::new(),
            writer: PayloadWriter::new(),
            wearables_serial: None,
            assets: collaborators.assets,
            inventory: collaborators.inventory,
            inventory_writer: collaborators.inventory_writer,
            channel: collaborators.channel,
            notifications: collaborators.notifications,
            bus,
            events,
            config,
        }
    }

    /// New receiver on the event bus.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.bus.receiver()
    }

    /// Worn wearables.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &WearableStore {
        &self.store
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &AppearanceConfig {
        &self.config
    }

    /// Last computed fingerprint of every region.
    #[inline]
    #[must_use]
    pub const fn fingerprints(&self) -> &RegionFingerprints {
        &self.fingerprints
    }

    /// The current outfit request and its state.
    #[must_use]
    pub fn request_state(&self) -> Option<(RequestId, RequestState)> {
        self.resolver.state()
    }

    /// Cancels the outfit request in flight, if any.
    pub fn cancel_outfit_request(&mut self) -> Option<RequestId> {
        self.resolver.cancel()
    }

    // =========================================================================
    // Outfits
    // =========================================================================

    /// Starts resolving `items`. Returns immediately; the outfit is applied
    /// by a later [`pump`](Self::pump). Any request in flight is superseded.
    pub fn request_wear_outfit(
        &mut self,
        items: Vec<OutfitEntry>,
        append: bool,
        replace: bool,
        now: Instant,
    ) -> Option<RequestId> {
        self.resolver
            .request_wear_outfit(items, append, replace, self.assets.as_mut(), now)
    }

    /// Wears the contents of an outfit folder.
    ///
    /// Wearables are sorted by their saved layer order and resolved; every
    /// other item is attached right away. Without `append` everything
    /// attached now is detached first. With `replace` the outfit's wearables
    /// clear their types and its attachments take their default points.
    /// Links are followed; unknown items are skipped.
    pub fn wear_outfit(
        &mut self,
        item_ids: &[ItemId],
        append: bool,
        replace: bool,
        now: Instant,
    ) -> Option<RequestId> {
        let mut wearables = Vec::new();
        let mut attachments = Vec::new();
        for &item_id in item_ids {
            let target = self.inventory.resolve_link(item_id);
            let Some(record) = self.inventory.get_item(target) else {
                tracing::warn!(%item_id, "outfit item not in inventory, skipped");
                continue;
            };
            match record.wearable_type {
                Some(wearable_type) => {
                    wearables.push(OutfitEntry::new(item_id, record.asset_id, wearable_type));
                }
                None => attachments.push(AttachmentItem {
                    item_id: target,
                    owner_id: record.owner_id,
                    name: record.name,
                    description: record.description,
                }),
            }
        }

        // Order markers live on the outfit's own items, which may be links.
        sort_by_layer_order(&mut wearables, self.inventory.as_ref());
        for entry in &mut wearables {
            entry.item_id = self.inventory.resolve_link(entry.item_id);
        }

        if !attachments.is_empty() {
            if let Err(err) = self.attach_items(&attachments, !append, replace) {
                tracing::warn!(%err, "outfit attachments not sent");
            }
        }
        self.request_wear_outfit(wearables, append, replace, now)
    }

    /// Applies completed asset fetches. When the active request is fully
    /// resolved (or timed out) it is composed into the store and the
    /// composition report is returned.
    pub fn pump(&mut self, now: Instant) -> Option<CompositionReport> {
        let outfit = self.resolver.poll(self.assets.as_mut(), now)?;
        let report = self
            .composer
            .compose(&outfit, &mut self.store, self.inventory.as_ref());
        self.resolver.mark_composed(outfit.request_id);
        self.store.update_declouded();
        self.flush_changes();

        for action in &report.recovery {
            self.run_recovery(action);
        }
        self.flush_changes();
        self.events.send(AppearanceEvent::OutfitComposed {
            request_id: report.request_id,
            changed_types: report.changed_types.clone(),
            recovered: report.recovery.len(),
            refused: report.refused.len(),
        });
        tracing::info!(
            request = %report.request_id,
            changed = report.changed_types.len(),
            recovered = report.recovery.len(),
            refused = report.refused.len(),
            "outfit composed"
        );
        Some(report)
    }

    fn run_recovery(&mut self, action: &RecoveryAction) {
        match action {
            RecoveryAction::ReplaceMissingWearable {
                wearable_type,
                index,
                missing_asset,
                item_id,
            } => {
                tracing::warn!(
                    %wearable_type,
                    index,
                    %missing_asset,
                    "missing wearable replaced by a default"
                );
                let mut payload = NotificationPayload::new();
                payload.insert("type".to_owned(), wearable_type.name().to_owned());
                payload.insert("item_id".to_owned(), item_id.to_string());
                payload.insert("asset_id".to_owned(), missing_asset.to_string());
                self.notifications.add(REPLACED_MISSING_WEARABLE, payload);
                self.events.send(AppearanceEvent::WearableMissing {
                    wearable_type: *wearable_type,
                    index: *index,
                    asset_id: *missing_asset,
                });
                self.save_replacement(*wearable_type, *item_id);
            }
        }
    }

    /// Files the default standing in for `item_id` as a new item in Lost and
    /// Found and rebinds the worn slot to it. The slot keeps the local
    /// default if the item cannot be created.
    fn save_replacement(&mut self, wearable_type: WearableType, item_id: ItemId) {
        let Some(index) = self
            .store
            .items(wearable_type)
            .iter()
            .position(|worn| worn.item_id == item_id && worn.is_synthesized())
        else {
            return;
        };
        let name = self.store.items(wearable_type)[index].name.clone();
        let request = NewItemRequest {
            wearable_type,
            name: name.clone(),
            folder: SystemFolder::LostAndFound,
        };
        let Some(created) = self.inventory_writer.create_item(request) else {
            tracing::warn!(%wearable_type, %item_id, "replacement wearable not saved");
            return;
        };
        let saved = WornItem::new(wearable_type, created.asset_id, created.item_id, name);
        match self.store.set(wearable_type, index, saved) {
            Ok(_) => tracing::info!(
                %wearable_type,
                item = %created.item_id,
                "replacement wearable saved to lost and found"
            ),
            Err(err) => tracing::warn!(%err, "replacement wearable not rebound"),
        }
    }

    // =========================================================================
    // Single wearable edits
    // =========================================================================

    /// Places `item` at `index` of its type.
    ///
    /// # Errors
    ///
    /// Store refusals, see [`WearableStore::set`].
    pub fn set_wearable(
        &mut self,
        wearable_type: WearableType,
        index: usize,
        item: WornItem,
    ) -> EngineResult<usize> {
        let index = self.store.set(wearable_type, index, item)?;
        self.store.update_declouded();
        self.flush_changes();
        Ok(index)
    }

    /// Adds `item` as the outermost layer of its type.
    ///
    /// # Errors
    ///
    /// Store refusals, see [`WearableStore::push`].
    pub fn push_wearable(&mut self, wearable_type: WearableType, item: WornItem) -> EngineResult<usize> {
        let index = self.store.push(wearable_type, item)?;
        self.store.update_declouded();
        self.flush_changes();
        Ok(index)
    }

    /// Removes the item at `index` without further checks.
    ///
    /// # Errors
    ///
    /// Store refusals, see [`WearableStore::pop_at`].
    pub fn pop_wearable(&mut self, wearable_type: WearableType, index: usize) -> EngineResult<WornItem> {
        let item = self.store.pop_at(wearable_type, index)?;
        self.flush_changes();
        Ok(item)
    }

    /// Takes a wearable off. Body parts can only be replaced, never removed.
    /// An item with unsaved edits raises a save notification before it goes.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidIndex`] when nothing is worn there,
    /// [`StoreError::BodyPartRequired`] for a body part.
    pub fn remove_wearable(&mut self, wearable_type: WearableType, index: usize) -> EngineResult<WornItem> {
        let Some(item) = self.store.get(wearable_type, index) else {
            return Err(StoreError::InvalidIndex {
                wearable_type,
                index,
                count: self.store.count(wearable_type),
            }
            .into());
        };
        if !self.store.can_remove(item) {
            return Err(StoreError::BodyPartRequired(wearable_type).into());
        }
        if item.dirty {
            let mut payload = NotificationPayload::new();
            payload.insert("type".to_owned(), wearable_type.name().to_owned());
            payload.insert("name".to_owned(), item.name.clone());
            payload.insert("item_id".to_owned(), item.item_id.to_string());
            self.notifications.add(WEARABLE_SAVE, payload);
        }
        self.pop_wearable(wearable_type, index)
    }

    /// Takes off every clothing item, outermost first per type.
    pub fn remove_all_clothes(&mut self) -> Vec<WornItem> {
        let removed = self.store.atomic(|store| {
            let mut removed = Vec::new();
            for &t in WearableType::ALL.iter().filter(|t| !t.is_body_part()) {
                if let Ok(items) = store.remove_all_of_type(t) {
                    removed.extend(items);
                }
            }
            removed
        });
        self.flush_changes();
        tracing::debug!(removed = removed.len(), "all clothing removed");
        removed
    }

    /// Renames a worn item.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotWorn`] if the item is not worn.
    pub fn rename_wearable(&mut self, item_id: ItemId, name: &str) -> EngineResult<()> {
        self.store.rename_item(item_id, name)?;
        self.flush_changes();
        Ok(())
    }

    /// Moves a worn item one layer inward or outward and returns its index.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotWorn`] if the item is not worn.
    pub fn move_wearable(&mut self, item_id: ItemId, closer_to_body: bool) -> EngineResult<usize> {
        let index = self.store.move_item(item_id, closer_to_body)?;
        self.flush_changes();
        Ok(index)
    }

    /// Description rewrites that record the current layer of the worn
    /// clothing among `item_ids`.
    #[must_use]
    pub fn layer_order_updates(&self, item_ids: &[ItemId]) -> Vec<LayerOrderUpdate> {
        layer_order_updates(&self.store, self.inventory.as_ref(), item_ids)
    }

    /// Publishes queued store notifications and brings fingerprints and the
    /// server up to date. Returns the types that changed.
    fn flush_changes(&mut self) -> Vec<WearableType> {
        let mut changed = self.store.take_updates();
        changed.sort_unstable();
        changed.dedup();
        if changed.is_empty() {
            return changed;
        }

        for &wearable_type in &changed {
            self.events.send(AppearanceEvent::WearableChanged { wearable_type });
        }
        let regions: Vec<BakeRegion> = BakeRegion::affected_by(&changed).collect();
        let refreshed = self.fingerprints.refresh(&self.store, &regions);
        for &(region, fingerprint) in &refreshed {
            tracing::debug!(%region, %fingerprint, "fingerprint changed");
            self.events
                .send(AppearanceEvent::FingerprintChanged { region, fingerprint });
        }

        if let Err(err) = self.send_wearables_update() {
            tracing::warn!(%err, "wearables update not sent");
        }
        if !refreshed.is_empty() {
            if let Err(err) = self.query_bake_cache() {
                tracing::warn!(%err, "bake cache query not sent");
            }
        }
        changed
    }

    // =========================================================================
    // Bake fingerprints
    // =========================================================================

    /// Fingerprint of `region` for what is worn now.
    #[must_use]
    pub fn compute_fingerprint(&self, region: BakeRegion) -> Fingerprint {
        compute_fingerprint(&self.store, region)
    }

    /// Fingerprint salted with this avatar's id, so no shared cache entry
    /// can match it.
    #[must_use]
    pub fn compute_poisoned_fingerprint(&self, region: BakeRegion) -> Fingerprint {
        compute_poisoned_fingerprint(&self.store, region, self.avatar_id)
    }

    /// Asks the server which regions already have a cached bake. Skipped
    /// while body parts are still missing or no region has a fingerprint.
    /// Returns the query serial when one was sent.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Protocol`] if the query cannot be encoded.
    pub fn query_bake_cache(&mut self) -> EngineResult<Option<u32>> {
        if !self.store.declouded() {
            tracing::debug!("bake cache query skipped, body parts missing");
            return Ok(None);
        }
        let Some(query) = self.bake_cache.build_query(&self.fingerprints) else {
            return Ok(None);
        };
        let request = CachedTextureRequest {
            serial: query.serial,
            entries: query
                .entries
                .iter()
                .map(|entry| (entry.fingerprint, entry.texture_index()))
                .collect(),
        };
        let payload = self.writer.serialize_cache_request(&request)?;
        self.channel.send_reliable(Opcode::AgentCachedTexture, payload);
        Ok(Some(query.serial))
    }

    /// Classifies a bake cache answer. Answers to an older query yield
    /// nothing.
    ///
    /// # Errors
    ///
    /// [`wardrobe_appearance::AppearanceError::UnknownTextureIndex`] when no
    /// entry names a known region.
    pub fn process_cache_response(
        &mut self,
        response: &CachedTextureResponse,
    ) -> EngineResult<Vec<CacheVerdict>> {
        let response = CacheResponse {
            serial: response.serial,
            entries: response
                .entries
                .iter()
                .map(|&(texture_index, texture_id)| CacheResponseEntry {
                    texture_index,
                    texture_id,
                })
                .collect(),
        };
        Ok(self.bake_cache.process_response(&response)?)
    }

    // =========================================================================
    // Server messages
    // =========================================================================

    /// Resolves the wearables the server has on record for this avatar.
    ///
    /// Updates with a serial no newer than the last one processed, or too
    /// short to describe the body parts, are ignored.
    pub fn process_initial_wearables(&mut self, update: &WearablesUpdate, now: Instant) -> Option<RequestId> {
        if self.wearables_serial.is_some_and(|last| update.serial <= last) {
            tracing::trace!(serial = update.serial, "stale wearables update discarded");
            return None;
        }
        let wearables = parse_initial_wearables(update)?;
        self.wearables_serial = Some(update.serial);
        let entries = wearables
            .iter()
            .map(|w| OutfitEntry::new(w.item_id, w.asset_id, w.wearable_type))
            .collect();
        self.request_wear_outfit(entries, false, true, now)
    }

    /// Decodes and dispatches an inbound appearance message.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Protocol`] for undecodable payloads, otherwise
    /// as the handler for the message.
    pub fn handle_message(&mut self, payload: &[u8], now: Instant) -> EngineResult<InboundOutcome> {
        match PayloadReader::new(payload).deserialize()? {
            InboundMessage::WearablesUpdate(update) => Ok(InboundOutcome::WearablesRequested(
                self.process_initial_wearables(&update, now),
            )),
            InboundMessage::CachedTextureResponse(response) => Ok(InboundOutcome::CacheVerdicts(
                self.process_cache_response(&response)?,
            )),
        }
    }

    /// Tells the server which item is worn in layer 0 of every type.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Protocol`] if the message cannot be encoded.
    pub fn send_wearables_update(&mut self) -> EngineResult<()> {
        let inventory = self.inventory.as_ref();
        let message = now_wearing(&self.store, |item_id| inventory.resolve_link(item_id));
        let payload = self.writer.serialize_now_wearing(&message)?;
        self.channel.send_reliable(Opcode::AgentIsNowWearing, payload);
        Ok(())
    }

    /// Sends attachment rez packets for `items`. Returns the packet count.
    ///
    /// `detach_all` drops everything attached now; `replace` puts each item
    /// on its default point instead of adding it there.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Protocol`] if a packet cannot be encoded, in
    /// which case nothing is sent.
    pub fn attach_items(
        &mut self,
        items: &[AttachmentItem],
        detach_all: bool,
        replace: bool,
    ) -> EngineResult<usize> {
        let packets = self.batcher.batch(items, detach_all, replace);
        let payloads = packets
            .iter()
            .map(|packet| self.writer.serialize_attachments(packet))
            .collect::<Result<Vec<_>, _>>()?;
        for payload in payloads {
            self.channel
                .send_reliable(Opcode::RezMultipleAttachmentsFromInv, payload);
        }
        Ok(packets.len())
    }

    /// Detaches objects by local id. Returns the packet count.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::Protocol`] if a packet cannot be encoded, in
    /// which case nothing is sent.
    pub fn detach_objects(&mut self, local_ids: &[u32]) -> EngineResult<usize> {
        let requests = batch_detach(local_ids, OBJECTS_PER_DETACH);
        let payloads = requests
            .iter()
            .map(|request| self.writer.serialize_detach(request))
            .collect::<Result<Vec<_>, _>>()?;
        for payload in payloads {
            self.channel.send_reliable(Opcode::ObjectDetach, payload);
        }
        Ok(requests.len())
    }
}
