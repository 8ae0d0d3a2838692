//! # Clothing Layer Order
//!
//! Worn clothing links remember their layer in the item description as
//! `@<type * 100 + index>`. Wearing an outfit folder sorts its items by this
//! marker so layers come back in the order they were saved.

use wardrobe_core::{ItemId, WearableStore, WearableType};
use wardrobe_shared::constants::{ORDER_NUMBER_SEPARATOR, ORDER_TYPE_STRIDE};

use crate::collaborators::InventoryIndex;
use crate::resolver::OutfitEntry;

/// Order marker for layer `index` of `wearable_type`.
#[must_use]
pub fn order_string(wearable_type: WearableType, index: usize) -> String {
    let number = u32::from(wearable_type.as_u8()) * ORDER_TYPE_STRIDE
        + u32::try_from(index).unwrap_or(ORDER_TYPE_STRIDE - 1);
    format!("{ORDER_NUMBER_SEPARATOR}{number}")
}

/// Parses an order marker, `None` if the description is not one.
#[must_use]
pub fn parse_order_number(description: &str) -> Option<u32> {
    description
        .trim()
        .strip_prefix(ORDER_NUMBER_SEPARATOR)?
        .parse()
        .ok()
}

/// Sorts outfit entries by the order marker of their inventory items.
///
/// Entries without a marker keep their relative order after the marked ones.
pub fn sort_by_layer_order(entries: &mut [OutfitEntry], inventory: &dyn InventoryIndex) {
    if entries.len() < 2 {
        return;
    }
    entries.sort_by_cached_key(|entry| {
        inventory
            .get_item(entry.item_id)
            .and_then(|record| parse_order_number(&record.description))
            .unwrap_or(u32::MAX)
    });
}

/// A description rewrite needed to record an item's current layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerOrderUpdate {
    /// Item whose description must change.
    pub item_id: ItemId,
    /// New description.
    pub description: String,
}

/// Description rewrites for the worn clothing among `item_ids`.
///
/// Links are resolved to the item they point at before looking them up in
/// the store. Body parts and items that are not worn are ignored.
#[must_use]
pub fn layer_order_updates(
    store: &WearableStore,
    inventory: &dyn InventoryIndex,
    item_ids: &[ItemId],
) -> Vec<LayerOrderUpdate> {
    let mut updates = Vec::new();
    for &item_id in item_ids {
        let Some(record) = inventory.get_item(item_id) else {
            continue;
        };
        let worn = store
            .find_by_item(item_id)
            .or_else(|| store.find_by_item(inventory.resolve_link(item_id)));
        let Some((wearable_type, index)) = worn.filter(|(t, _)| !t.is_body_part()) else {
            continue;
        };
        let description = order_string(wearable_type, index);
        if record.description != description {
            tracing::debug!(%item_id, from = %record.description, to = %description, "layer order changed");
            updates.push(LayerOrderUpdate {
                item_id,
                description,
            });
        }
    }
    updates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ItemRecord;
    use std::collections::HashMap;
    use uuid::Uuid;
    use wardrobe_core::{AssetId, WornItem};

    struct Inventory(HashMap<ItemId, ItemRecord>);

    impl InventoryIndex for Inventory {
        fn get_item(&self, item_id: ItemId) -> Option<ItemRecord> {
            self.0.get(&item_id).cloned()
        }
    }

    fn record(item_id: ItemId, description: &str, linked: Option<ItemId>) -> ItemRecord {
        ItemRecord {
            item_id,
            asset_id: AssetId::generate(),
            linked_item_id: linked,
            wearable_type: Some(WearableType::Shirt),
            name: String::new(),
            description: description.to_owned(),
            owner_id: Uuid::nil(),
        }
    }

    #[test]
    fn test_order_string() {
        assert_eq!(order_string(WearableType::Shirt, 2), "@402");
        assert_eq!(order_string(WearableType::Shape, 0), "@0");
        assert_eq!(parse_order_number("@1403"), Some(1403));
        assert_eq!(parse_order_number("my jacket"), None);
        assert_eq!(parse_order_number(""), None);
    }

    #[test]
    fn test_sort_by_layer_order() {
        let ids: Vec<ItemId> = (0..4).map(|_| ItemId::generate()).collect();
        let inventory = Inventory(HashMap::from([
            (ids[0], record(ids[0], "", None)),
            (ids[1], record(ids[1], "@1201", None)),
            (ids[2], record(ids[2], "@402", None)),
            (ids[3], record(ids[3], "@400", None)),
        ]));
        let mut entries: Vec<_> = ids
            .iter()
            .map(|id| OutfitEntry::new(*id, AssetId::generate(), WearableType::Shirt))
            .collect();
        sort_by_layer_order(&mut entries, &inventory);
        let order: Vec<_> = entries.iter().map(|e| e.item_id).collect();
        assert_eq!(order, vec![ids[3], ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_updates_follow_links() {
        let base = ItemId::generate();
        let link = ItemId::generate();
        let current = ItemId::generate();
        let inventory = Inventory(HashMap::from([
            (base, record(base, "", None)),
            (link, record(link, "@400", Some(base))),
            (current, record(current, "@401", None)),
        ]));
        let mut store = WearableStore::new();
        for id in [current, base] {
            store
                .push(
                    WearableType::Shirt,
                    WornItem::new(WearableType::Shirt, AssetId::generate(), id, "Tee"),
                )
                .unwrap();
        }
        let updates = layer_order_updates(&store, &inventory, &[link, current]);
        assert_eq!(
            updates,
            vec![
                LayerOrderUpdate { item_id: link, description: "@401".into() },
                LayerOrderUpdate { item_id: current, description: "@400".into() },
            ]
        );
    }
}
