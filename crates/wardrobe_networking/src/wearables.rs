//! # Wearables Messages
//!
//! Turns the worn set into an `AgentIsNowWearing` message and the login
//! `AgentWearablesUpdate` into wearables to resolve.

use wardrobe_core::{AssetId, ItemId, WearableStore, WearableType};
use wardrobe_shared::constants::MIN_INITIAL_WEARABLE_BLOCKS;

use crate::protocol::{NowWearing, WearablesUpdate};

/// Builds `AgentIsNowWearing` from the store: for every type in wire order
/// the item in layer 0, passed through `resolve_link`, or nil when the type
/// is empty.
pub fn now_wearing<F>(store: &WearableStore, mut resolve_link: F) -> NowWearing
where
    F: FnMut(ItemId) -> ItemId,
{
    let entries = WearableType::ALL
        .iter()
        .map(|&t| {
            let item = store
                .get(t, 0)
                .map_or(ItemId::NULL, |worn| resolve_link(worn.item_id));
            (item, t)
        })
        .collect();
    NowWearing { entries }
}

/// A wearable the server has on record at login.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitialWearable {
    /// Type.
    pub wearable_type: WearableType,
    /// Inventory item.
    pub item_id: ItemId,
    /// Asset.
    pub asset_id: AssetId,
}

/// Extracts wearables from a login update.
///
/// Returns `None` when the update has fewer than
/// [`MIN_INITIAL_WEARABLE_BLOCKS`] blocks, since it cannot describe the body
/// parts. Blocks with an invalid type byte are skipped and logged; blocks
/// with a null item or asset mean the slot is empty and are left out. The
/// server describes one item per type, so a repeated type keeps its last
/// block.
#[must_use]
pub fn parse_initial_wearables(update: &WearablesUpdate) -> Option<Vec<InitialWearable>> {
    if update.wearables.len() < MIN_INITIAL_WEARABLE_BLOCKS {
        tracing::warn!(
            blocks = update.wearables.len(),
            serial = update.serial,
            "initial wearables update too short, ignored"
        );
        return None;
    }

    let mut out = Vec::with_capacity(update.wearables.len());
    for wire in &update.wearables {
        let wearable_type = match wire.wearable_type() {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(%err, item = %wire.item_id, "initial wearable skipped");
                continue;
            }
        };
        if wire.item_id.is_null() || wire.asset_id.is_null() {
            continue;
        }
        out.retain(|w: &InitialWearable| w.wearable_type != wearable_type);
        out.push(InitialWearable {
            wearable_type,
            item_id: wire.item_id,
            asset_id: wire.asset_id,
        });
    }
    tracing::debug!(serial = update.serial, wearables = out.len(), "initial wearables parsed");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::WireWearable;
    use wardrobe_core::WornItem;

    fn block(t: u8) -> WireWearable {
        WireWearable {
            item_id: ItemId::generate(),
            asset_id: AssetId::generate(),
            type_index: t,
        }
    }

    #[test]
    fn test_now_wearing_uses_layer_zero() {
        let mut store = WearableStore::new();
        let inner = WornItem::new(WearableType::Shirt, AssetId::generate(), ItemId::generate(), "a");
        let outer = WornItem::new(WearableType::Shirt, AssetId::generate(), ItemId::generate(), "b");
        store.push(WearableType::Shirt, inner.clone()).unwrap();
        store.push(WearableType::Shirt, outer).unwrap();

        let message = now_wearing(&store, |id| id);
        assert_eq!(message.entries.len(), WearableType::COUNT);
        assert_eq!(message.entries[4], (inner.item_id, WearableType::Shirt));
        assert_eq!(message.entries[0], (ItemId::NULL, WearableType::Shape));
    }

    #[test]
    fn test_now_wearing_resolves_links() {
        let mut store = WearableStore::new();
        let link = ItemId::generate();
        let target = ItemId::generate();
        store
            .push(WearableType::Hair, WornItem::new(WearableType::Hair, AssetId::generate(), link, "hair"))
            .unwrap();
        let message = now_wearing(&store, |id| if id == link { target } else { id });
        assert_eq!(message.entries[2].0, target);
    }

    #[test]
    fn test_short_update_ignored() {
        let update = WearablesUpdate {
            serial: 1,
            wearables: vec![block(0), block(1), block(2)],
        };
        assert_eq!(parse_initial_wearables(&update), None);
    }

    #[test]
    fn test_invalid_and_empty_blocks_skipped() {
        let mut empty = block(5);
        empty.asset_id = AssetId::NULL;
        let update = WearablesUpdate {
            serial: 2,
            wearables: vec![block(0), block(1), block(42), empty, block(3)],
        };
        let parsed = parse_initial_wearables(&update).unwrap();
        let types: Vec<WearableType> = parsed.iter().map(|w| w.wearable_type).collect();
        assert_eq!(types, vec![WearableType::Shape, WearableType::Skin, WearableType::Eyes]);
    }

    #[test]
    fn test_repeated_type_keeps_last_block() {
        let first = block(4);
        let last = block(4);
        let update = WearablesUpdate {
            serial: 3,
            wearables: vec![block(0), first, block(1), block(2), block(3), last],
        };
        let parsed = parse_initial_wearables(&update).unwrap();
        let shirts: Vec<&InitialWearable> = parsed
            .iter()
            .filter(|w| w.wearable_type == WearableType::Shirt)
            .collect();
        assert_eq!(shirts.len(), 1);
        assert_eq!(shirts[0].item_id, last.item_id);
        assert_eq!(shirts[0].asset_id, last.asset_id);
        assert_eq!(parsed.len(), 5);
    }
}
