//! # Appearance Composer
//!
//! Applies a resolved outfit to the wearable store.
//!
//! ## Rules
//!
//! 1. Entries unknown to the inventory, or whose inventory record no longer
//!    points at the requested asset, are refused.
//! 2. Body parts: scanning the batch from last to first, the last entry of
//!    each body-part type wins. Earlier duplicates are skipped.
//! 3. In one atomic section: body-part types supplied by the batch are
//!    cleared; with `replace`, the batch's clothing types are cleared; without
//!    `append`, all clothing is cleared. Then entries are inserted in request
//!    order.
//! 4. Body parts and single-instance clothing overwrite layer 0; other
//!    clothing stacks on top.
//! 5. A missing asset is replaced by a default wearable. The follow-up work
//!    (notification, saving the default into Lost and Found) is returned as
//!    a [`RecoveryAction`].
//!
//! Composing the same batch twice leaves the store as composing it once.

use wardrobe_core::{AssetId, ItemId, StoreError, WearableStore, WearableType, WornItem};
use wardrobe_shared::{BakeRegion, RequestId};

use crate::collaborators::InventoryIndex;
use crate::config::ExclusivityPolicy;
use crate::error::AppearanceError;
use crate::resolver::{OutfitEntry, ResolvedOutfit};

/// Deferred side effect of a composition, executed by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecoveryAction {
    /// A default wearable was placed where a missing asset should have gone.
    ReplaceMissingWearable {
        /// Type of the slot.
        wearable_type: WearableType,
        /// Layer the default landed at.
        index: usize,
        /// Asset that could not be fetched.
        missing_asset: AssetId,
        /// Inventory item that referenced it.
        item_id: ItemId,
    },
}

/// An entry the composer did not apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefusedEntry {
    /// Position in the request.
    pub index: usize,
    /// The entry.
    pub entry: OutfitEntry,
    /// Why it was refused.
    pub reason: AppearanceError,
}

/// What a composition did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositionReport {
    /// Request that was composed.
    pub request_id: RequestId,
    /// Types whose contents differ from before, in wire order.
    pub changed_types: Vec<WearableType>,
    /// Baked regions fed by a changed type.
    pub dirty_regions: Vec<BakeRegion>,
    /// Indices of body-part entries overridden by a later entry.
    pub skipped: Vec<usize>,
    /// Entries that could not be applied.
    pub refused: Vec<RefusedEntry>,
    /// Follow-up work for missing assets.
    pub recovery: Vec<RecoveryAction>,
}

impl CompositionReport {
    fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            changed_types: Vec::new(),
            dirty_regions: Vec::new(),
            skipped: Vec::new(),
            refused: Vec::new(),
            recovery: Vec::new(),
        }
    }

    /// Returns true if the store was left untouched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed_types.is_empty()
    }
}

struct Candidate {
    index: usize,
    entry: OutfitEntry,
    item: WornItem,
    missing: bool,
    skip: bool,
}

/// Applies resolved outfits to a [`WearableStore`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AppearanceComposer {
    policy: ExclusivityPolicy,
}

impl AppearanceComposer {
    /// Creates a composer with the given exclusivity policy.
    #[must_use]
    pub const fn new(policy: ExclusivityPolicy) -> Self {
        Self { policy }
    }

    /// The exclusivity policy in force.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> &ExclusivityPolicy {
        &self.policy
    }

    /// Applies `outfit` to `store`. Performs no I/O.
    pub fn compose(
        &self,
        outfit: &ResolvedOutfit,
        store: &mut WearableStore,
        inventory: &dyn InventoryIndex,
    ) -> CompositionReport {
        let mut report = CompositionReport::new(outfit.request_id);
        let before: Vec<Vec<WornItem>> = WearableType::ALL
            .iter()
            .map(|t| store.items(*t).to_vec())
            .collect();

        let mut candidates = gate(outfit, inventory, &mut report);
        mark_duplicate_body_parts(&mut candidates, &mut report);

        let clear = types_to_clear(&candidates, outfit.append, outfit.replace);
        store.atomic(|store| {
            for t in WearableType::ALL.into_iter().filter(|t| clear[t.index()]) {
                if let Err(err) = store.remove_all_of_type(t) {
                    tracing::warn!(wearable_type = %t, %err, "could not clear wearable type");
                }
            }
            for candidate in candidates.into_iter().filter(|c| !c.skip) {
                self.insert(candidate, store, &mut report);
            }
        });

        report.changed_types = WearableType::ALL
            .into_iter()
            .filter(|t| store.items(*t) != before[t.index()].as_slice())
            .collect();
        report.dirty_regions = BakeRegion::affected_by(&report.changed_types).collect();

        tracing::info!(
            request = %outfit.request_id,
            changed = report.changed_types.len(),
            skipped = report.skipped.len(),
            refused = report.refused.len(),
            recovered = report.recovery.len(),
            "outfit composed"
        );
        report
    }

    fn insert(&self, candidate: Candidate, store: &mut WearableStore, report: &mut CompositionReport) {
        let Candidate {
            index,
            entry,
            item,
            missing,
            ..
        } = candidate;
        let t = entry.wearable_type;

        let result = if self.policy.is_single_instance(t) {
            store.set(t, 0, item)
        } else {
            store.push(t, item)
        };

        match result {
            Ok(slot) => {
                tracing::debug!(wearable_type = %t, slot, asset_id = %entry.asset_id, "wearable placed");
                if missing {
                    report.recovery.push(RecoveryAction::ReplaceMissingWearable {
                        wearable_type: t,
                        index: slot,
                        missing_asset: entry.asset_id,
                        item_id: entry.item_id,
                    });
                }
            }
            Err(StoreError::AlreadyWorn { .. }) => {
                tracing::debug!(wearable_type = %t, item_id = %entry.item_id, "item already worn");
            }
            Err(err) => {
                tracing::warn!(wearable_type = %t, item_id = %entry.item_id, %err, "wearable refused");
                report.refused.push(RefusedEntry {
                    index,
                    entry,
                    reason: err.into(),
                });
            }
        }
    }
}

fn gate(
    outfit: &ResolvedOutfit,
    inventory: &dyn InventoryIndex,
    report: &mut CompositionReport,
) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(outfit.entries.len());
    for (index, resolved) in outfit.entries.iter().enumerate() {
        let entry = resolved.entry;
        let Some(record) = inventory.get_item(entry.item_id) else {
            tracing::warn!(item_id = %entry.item_id, "outfit item not in inventory");
            report.refused.push(RefusedEntry {
                index,
                entry,
                reason: AppearanceError::UnknownItem(entry.item_id),
            });
            continue;
        };

        let usable = match &resolved.outcome {
            Ok(_) if record.asset_id != entry.asset_id => {
                tracing::warn!(item_id = %entry.item_id, "inventory item changed asset since request");
                report.refused.push(RefusedEntry {
                    index,
                    entry,
                    reason: AppearanceError::AssetMismatch {
                        item_id: entry.item_id,
                        requested: entry.asset_id,
                        recorded: record.asset_id,
                    },
                });
                continue;
            }
            Ok(asset) if asset.wearable_type != entry.wearable_type => {
                tracing::warn!(
                    asset_id = %entry.asset_id,
                    expected = %entry.wearable_type,
                    actual = %asset.wearable_type,
                    "asset type differs from request, treating as missing"
                );
                false
            }
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(asset_id = %entry.asset_id, %err, "wearable asset missing");
                false
            }
        };

        let item = if usable {
            WornItem::new(entry.wearable_type, entry.asset_id, entry.item_id, record.name)
        } else {
            let mut item = WornItem::synthesized_default(entry.wearable_type);
            item.item_id = entry.item_id;
            item
        };
        candidates.push(Candidate {
            index,
            entry,
            item,
            missing: !usable,
            skip: false,
        });
    }
    candidates
}

fn mark_duplicate_body_parts(candidates: &mut [Candidate], report: &mut CompositionReport) {
    let mut seen = [false; WearableType::COUNT];
    for candidate in candidates.iter_mut().rev() {
        let t = candidate.entry.wearable_type;
        if !t.is_body_part() {
            continue;
        }
        if seen[t.index()] {
            tracing::debug!(wearable_type = %t, index = candidate.index, "duplicate body part skipped");
            candidate.skip = true;
            report.skipped.push(candidate.index);
        } else {
            seen[t.index()] = true;
        }
    }
    report.skipped.sort_unstable();
}

fn types_to_clear(candidates: &[Candidate], append: bool, replace: bool) -> [bool; WearableType::COUNT] {
    let mut clear = [false; WearableType::COUNT];
    for candidate in candidates.iter().filter(|c| !c.skip) {
        let t = candidate.entry.wearable_type;
        if t.is_body_part() || replace {
            clear[t.index()] = true;
        }
    }
    if !append {
        for t in WearableType::ALL.into_iter().filter(|t| !t.is_body_part()) {
            clear[t.index()] = true;
        }
    }
    clear
}
