//! # Wearable Store
//!
//! Per-type ordered slot lists. Index 0 is the layer closest to the body,
//! the last index is the outermost layer.
//!
//! ## Invariants
//!
//! - A body-part type never holds more than one item.
//! - Once declouded, a body part is never observably empty. It can only be
//!   removed inside an [`WearableStore::atomic`] section that puts a
//!   replacement back.
//! - A clothing type holds at most [`MAX_PER_TYPE`] items.
//!
//! ## Notifications
//!
//! Every mutating call that changes observable state queues exactly one
//! "wearable updated" notification for its type. Inside an atomic section
//! notifications are held back and coalesced: on exit, one notification is
//! queued per type whose contents differ from the state at entry. Callers
//! drain the queue with [`WearableStore::take_updates`].
//!
//! [`MAX_PER_TYPE`]: crate::wearable::MAX_PER_TYPE

use crate::error::{StoreError, StoreResult};
use crate::ids::{AssetId, ItemId};
use crate::wearable::{WearableType, WornItem};

type SlotTable = [Vec<WornItem>; WearableType::COUNT];

/// The set of wearables currently worn by one avatar.
#[derive(Debug, Default)]
pub struct WearableStore {
    slots: SlotTable,
    declouded: bool,
    /// Nesting depth of atomic sections.
    atomic_depth: u32,
    /// Contents of each type when first touched inside the current atomic section.
    entry_state: [Option<Vec<WornItem>>; WearableType::COUNT],
    /// Pending "wearable updated" notifications.
    updates: Vec<WearableType>,
}

impl WearableStore {
    /// Creates an empty store. The avatar is not declouded yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Item at `(wearable_type, index)`, `None` when out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, wearable_type: WearableType, index: usize) -> Option<&WornItem> {
        self.slots[wearable_type.index()].get(index)
    }

    /// Number of items worn for a type.
    #[inline]
    #[must_use]
    pub fn count(&self, wearable_type: WearableType) -> usize {
        self.slots[wearable_type.index()].len()
    }

    /// Total number of worn items across all types.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// All items of a type, innermost first.
    #[inline]
    #[must_use]
    pub fn items(&self, wearable_type: WearableType) -> &[WornItem] {
        &self.slots[wearable_type.index()]
    }

    /// Iterates over every type with its items, in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (WearableType, &[WornItem])> {
        WearableType::ALL
            .into_iter()
            .map(move |t| (t, self.slots[t.index()].as_slice()))
    }

    /// Position of `item` within its type, matched by inventory item id.
    #[must_use]
    pub fn index_of(&self, item: &WornItem) -> Option<usize> {
        self.slots[item.wearable_type.index()]
            .iter()
            .position(|w| w.item_id == item.item_id)
    }

    /// Finds where an inventory item is worn.
    #[must_use]
    pub fn find_by_item(&self, item_id: ItemId) -> Option<(WearableType, usize)> {
        if item_id.is_null() {
            return None;
        }
        self.iter().find_map(|(t, items)| {
            items
                .iter()
                .position(|w| w.item_id == item_id)
                .map(|index| (t, index))
        })
    }

    /// First worn item backed by `asset_id`.
    #[must_use]
    pub fn find_by_asset(&self, asset_id: AssetId) -> Option<&WornItem> {
        self.slots
            .iter()
            .flat_map(|items| items.iter())
            .find(|w| w.asset_id == asset_id)
    }

    /// Returns true when the inventory item is worn.
    #[must_use]
    pub fn is_wearing_item(&self, item_id: ItemId) -> bool {
        self.find_by_item(item_id).is_some()
    }

    /// Outermost layer of a type.
    #[must_use]
    pub fn top(&self, wearable_type: WearableType) -> Option<&WornItem> {
        self.slots[wearable_type.index()].last()
    }

    /// Innermost layer of a type.
    #[must_use]
    pub fn bottom(&self, wearable_type: WearableType) -> Option<&WornItem> {
        self.slots[wearable_type.index()].first()
    }

    /// False for the last remaining item of a body part.
    #[must_use]
    pub fn can_remove(&self, item: &WornItem) -> bool {
        !item.wearable_type.is_body_part() || self.count(item.wearable_type) > 1
    }

    /// Returns true if the item can move one layer in the given direction.
    #[must_use]
    pub fn can_move(&self, item_id: ItemId, closer_to_body: bool) -> bool {
        let Some((t, index)) = self.find_by_item(item_id) else {
            return false;
        };
        if closer_to_body {
            index > 0
        } else {
            index + 1 < self.count(t)
        }
    }

    /// True once every body part has been filled after the initial load.
    #[inline]
    #[must_use]
    pub const fn declouded(&self) -> bool {
        self.declouded
    }

    /// Marks the avatar declouded if all body parts are worn.
    ///
    /// Declouding is one-way. Returns the current state.
    pub fn update_declouded(&mut self) -> bool {
        if !self.declouded {
            self.declouded = WearableType::BODY_PARTS
                .iter()
                .all(|t| !self.slots[t.index()].is_empty());
            if self.declouded {
                tracing::debug!("all body parts worn, avatar declouded");
            }
        }
        self.declouded
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Places `item` at `index`, replacing whatever was there.
    ///
    /// When no item exists at `index` this behaves like [`Self::push`].
    /// Replacing a slot with an identical item changes nothing and queues no
    /// notification.
    ///
    /// # Errors
    ///
    /// [`StoreError::TypeMismatch`] if the item belongs to another type,
    /// [`StoreError::AlreadyWorn`] if its inventory item occupies another
    /// layer of the type, or any error from [`Self::push`].
    pub fn set(
        &mut self,
        wearable_type: WearableType,
        index: usize,
        item: WornItem,
    ) -> StoreResult<usize> {
        check_type(wearable_type, &item)?;
        if index >= self.count(wearable_type) {
            return self.push(wearable_type, item);
        }

        let slot = &self.slots[wearable_type.index()];
        if slot[index] == item {
            return Ok(index);
        }
        if !item.item_id.is_null()
            && slot
                .iter()
                .enumerate()
                .any(|(i, w)| i != index && w.item_id == item.item_id)
        {
            return Err(StoreError::AlreadyWorn {
                wearable_type,
                item_id: item.item_id,
            });
        }

        self.begin_mutation(wearable_type);
        self.slots[wearable_type.index()][index] = item;
        self.end_mutation(wearable_type);
        Ok(index)
    }

    /// Appends `item` as the new outermost layer and returns its index.
    ///
    /// # Errors
    ///
    /// [`StoreError::SlotFull`] when the type is at capacity,
    /// [`StoreError::AlreadyWorn`] when the inventory item is already worn as
    /// this type, [`StoreError::TypeMismatch`] for an item of another type.
    pub fn push(&mut self, wearable_type: WearableType, item: WornItem) -> StoreResult<usize> {
        check_type(wearable_type, &item)?;
        let slot = &self.slots[wearable_type.index()];
        if !item.item_id.is_null() && slot.iter().any(|w| w.item_id == item.item_id) {
            return Err(StoreError::AlreadyWorn {
                wearable_type,
                item_id: item.item_id,
            });
        }
        let capacity = wearable_type.capacity();
        if slot.len() >= capacity {
            tracing::warn!(%wearable_type, capacity, "slot full, wearable not added");
            return Err(StoreError::SlotFull {
                wearable_type,
                capacity,
            });
        }
        if !item.asset_id.is_null() && slot.iter().any(|w| w.asset_id == item.asset_id) {
            tracing::debug!(%wearable_type, asset_id = %item.asset_id, "asset worn twice in one type");
        }

        self.begin_mutation(wearable_type);
        let slot = &mut self.slots[wearable_type.index()];
        slot.push(item);
        let index = slot.len() - 1;
        self.end_mutation(wearable_type);
        Ok(index)
    }

    /// Removes and returns the item at `index`.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidIndex`] when nothing is there,
    /// [`StoreError::BodyPartRequired`] when removing a declouded body part
    /// outside an atomic section.
    pub fn pop_at(&mut self, wearable_type: WearableType, index: usize) -> StoreResult<WornItem> {
        let count = self.count(wearable_type);
        if index >= count {
            return Err(StoreError::InvalidIndex {
                wearable_type,
                index,
                count,
            });
        }
        self.check_body_part_removal(wearable_type)?;

        self.begin_mutation(wearable_type);
        let item = self.slots[wearable_type.index()].remove(index);
        self.end_mutation(wearable_type);
        Ok(item)
    }

    /// Removes every item of a type, outermost first.
    ///
    /// # Errors
    ///
    /// [`StoreError::BodyPartRequired`] for a declouded body part outside an
    /// atomic section.
    pub fn remove_all_of_type(&mut self, wearable_type: WearableType) -> StoreResult<Vec<WornItem>> {
        if self.slots[wearable_type.index()].is_empty() {
            return Ok(Vec::new());
        }
        self.check_body_part_removal(wearable_type)?;

        self.begin_mutation(wearable_type);
        let mut removed = std::mem::take(&mut self.slots[wearable_type.index()]);
        removed.reverse();
        self.end_mutation(wearable_type);
        Ok(removed)
    }

    /// Renames the worn item backed by `item_id`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotWorn`] if no worn item references it.
    pub fn rename_item(&mut self, item_id: ItemId, name: &str) -> StoreResult<()> {
        let (t, index) = self.find_by_item(item_id).ok_or(StoreError::NotWorn(item_id))?;
        if self.slots[t.index()][index].name == name {
            return Ok(());
        }
        self.begin_mutation(t);
        name.clone_into(&mut self.slots[t.index()][index].name);
        self.end_mutation(t);
        Ok(())
    }

    /// Flags local, unsaved edits on a worn item.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotWorn`] if no worn item references it.
    pub fn mark_dirty(&mut self, item_id: ItemId) -> StoreResult<()> {
        self.set_dirty(item_id, true)
    }

    /// Clears the unsaved flag on a worn item.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotWorn`] if no worn item references it.
    pub fn mark_saved(&mut self, item_id: ItemId) -> StoreResult<()> {
        self.set_dirty(item_id, false)
    }

    /// Moves a worn item one layer inward or outward. Returns its new index;
    /// an item already at the edge stays where it is.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotWorn`] if no worn item references it.
    pub fn move_item(&mut self, item_id: ItemId, closer_to_body: bool) -> StoreResult<usize> {
        let (t, index) = self.find_by_item(item_id).ok_or(StoreError::NotWorn(item_id))?;
        if !self.can_move(item_id, closer_to_body) {
            return Ok(index);
        }
        let target = if closer_to_body { index - 1 } else { index + 1 };
        self.begin_mutation(t);
        self.slots[t.index()].swap(index, target);
        self.end_mutation(t);
        Ok(target)
    }

    /// Runs `f` as one critical section.
    ///
    /// Body parts may be removed inside it, and notifications are coalesced
    /// until the outermost section ends.
    pub fn atomic<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.atomic_depth += 1;
        let result = f(self);
        self.atomic_depth -= 1;
        if self.atomic_depth == 0 {
            self.finish_atomic();
        }
        result
    }

    /// Drains queued "wearable updated" notifications, oldest first.
    pub fn take_updates(&mut self) -> Vec<WearableType> {
        std::mem::take(&mut self.updates)
    }

    /// Returns true if notifications are waiting.
    #[must_use]
    pub fn has_pending_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn set_dirty(&mut self, item_id: ItemId, dirty: bool) -> StoreResult<()> {
        let (t, index) = self.find_by_item(item_id).ok_or(StoreError::NotWorn(item_id))?;
        if self.slots[t.index()][index].dirty == dirty {
            return Ok(());
        }
        self.begin_mutation(t);
        self.slots[t.index()][index].dirty = dirty;
        self.end_mutation(t);
        Ok(())
    }

    fn check_body_part_removal(&self, wearable_type: WearableType) -> StoreResult<()> {
        if wearable_type.is_body_part() && self.declouded && self.atomic_depth == 0 {
            tracing::warn!(%wearable_type, "refusing to remove the only body part");
            return Err(StoreError::BodyPartRequired(wearable_type));
        }
        Ok(())
    }

    fn begin_mutation(&mut self, wearable_type: WearableType) {
        if self.atomic_depth > 0 {
            let i = wearable_type.index();
            if self.entry_state[i].is_none() {
                self.entry_state[i] = Some(self.slots[i].clone());
            }
        }
    }

    fn end_mutation(&mut self, wearable_type: WearableType) {
        if self.atomic_depth == 0 {
            self.updates.push(wearable_type);
        }
    }

    fn finish_atomic(&mut self) {
        for t in WearableType::ALL {
            let i = t.index();
            if let Some(before) = self.entry_state[i].take() {
                if before != self.slots[i] {
                    self.updates.push(t);
                }
            }
            if self.declouded && t.is_body_part() && self.slots[i].is_empty() {
                tracing::warn!(wearable_type = %t, "body part left empty by atomic section");
            }
        }
    }
}

fn check_type(slot_type: WearableType, item: &WornItem) -> StoreResult<()> {
    if item.wearable_type == slot_type {
        Ok(())
    } else {
        tracing::warn!(%slot_type, item_type = %item.wearable_type, "wearable offered to wrong slot");
        Err(StoreError::TypeMismatch {
            slot_type,
            item_type: item.wearable_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wearable::MAX_PER_TYPE;

    fn item(t: WearableType) -> WornItem {
        WornItem::new(t, AssetId::generate(), ItemId::generate(), t.name())
    }

    fn declouded_store() -> WearableStore {
        let mut store = WearableStore::new();
        for t in WearableType::BODY_PARTS {
            store.push(t, item(t)).unwrap();
        }
        assert!(store.update_declouded());
        store.take_updates();
        store
    }

    #[test]
    fn test_get_out_of_range() {
        let store = WearableStore::new();
        assert!(store.get(WearableType::Shirt, 0).is_none());
        assert!(store.get(WearableType::Shirt, 99).is_none());
    }

    #[test]
    fn test_push_until_full() {
        let mut store = WearableStore::new();
        for i in 0..MAX_PER_TYPE {
            assert_eq!(store.push(WearableType::Shirt, item(WearableType::Shirt)), Ok(i));
        }
        let err = store.push(WearableType::Shirt, item(WearableType::Shirt));
        assert!(matches!(err, Err(StoreError::SlotFull { capacity: MAX_PER_TYPE, .. })));
        assert_eq!(store.count(WearableType::Shirt), MAX_PER_TYPE);
        assert_eq!(store.take_updates().len(), MAX_PER_TYPE);
    }

    #[test]
    fn test_body_part_holds_one() {
        let mut store = WearableStore::new();
        store.push(WearableType::Hair, item(WearableType::Hair)).unwrap();
        assert!(store.push(WearableType::Hair, item(WearableType::Hair)).is_err());
        assert_eq!(store.count(WearableType::Hair), 1);
    }

    #[test]
    fn test_set_replaces_or_pushes() {
        let mut store = WearableStore::new();
        let first = item(WearableType::Shape);
        assert_eq!(store.set(WearableType::Shape, 0, first), Ok(0));
        let second = item(WearableType::Shape);
        assert_eq!(store.set(WearableType::Shape, 0, second.clone()), Ok(0));
        assert_eq!(store.get(WearableType::Shape, 0), Some(&second));
        assert_eq!(store.count(WearableType::Shape), 1);
        // Index past the end on a fresh type appends.
        assert_eq!(store.set(WearableType::Gloves, 3, item(WearableType::Gloves)), Ok(0));
    }

    #[test]
    fn test_set_identical_is_silent() {
        let mut store = WearableStore::new();
        let shirt = item(WearableType::Shirt);
        store.push(WearableType::Shirt, shirt.clone()).unwrap();
        store.take_updates();
        store.set(WearableType::Shirt, 0, shirt).unwrap();
        assert!(!store.has_pending_updates());
    }

    #[test]
    fn test_type_mismatch() {
        let mut store = WearableStore::new();
        let err = store.push(WearableType::Pants, item(WearableType::Shirt));
        assert!(matches!(err, Err(StoreError::TypeMismatch { .. })));
        assert_eq!(store.total_count(), 0);
    }

    #[test]
    fn test_already_worn() {
        let mut store = WearableStore::new();
        let shirt = item(WearableType::Shirt);
        store.push(WearableType::Shirt, shirt.clone()).unwrap();
        let err = store.push(WearableType::Shirt, shirt);
        assert!(matches!(err, Err(StoreError::AlreadyWorn { .. })));
    }

    #[test]
    fn test_pop_body_part_requires_atomic() {
        let mut store = declouded_store();
        assert_eq!(
            store.pop_at(WearableType::Skin, 0),
            Err(StoreError::BodyPartRequired(WearableType::Skin))
        );
        let replacement = item(WearableType::Skin);
        store.atomic(|s| {
            s.pop_at(WearableType::Skin, 0).unwrap();
            s.push(WearableType::Skin, replacement.clone()).unwrap();
        });
        assert_eq!(store.get(WearableType::Skin, 0), Some(&replacement));
        assert_eq!(store.take_updates(), vec![WearableType::Skin]);
    }

    #[test]
    fn test_atomic_coalesces_and_skips_noops() {
        let mut store = WearableStore::new();
        let shirt = item(WearableType::Shirt);
        store.push(WearableType::Shirt, shirt.clone()).unwrap();
        store.take_updates();

        store.atomic(|s| {
            s.remove_all_of_type(WearableType::Shirt).unwrap();
            s.push(WearableType::Shirt, shirt.clone()).unwrap();
            s.push(WearableType::Pants, item(WearableType::Pants)).unwrap();
            s.push(WearableType::Socks, item(WearableType::Socks)).unwrap();
            s.pop_at(WearableType::Socks, 0).unwrap();
        });
        assert_eq!(store.take_updates(), vec![WearableType::Pants]);
    }

    #[test]
    fn test_pop_invalid_index() {
        let mut store = WearableStore::new();
        assert!(matches!(
            store.pop_at(WearableType::Jacket, 0),
            Err(StoreError::InvalidIndex { count: 0, .. })
        ));
    }

    #[test]
    fn test_index_of_uses_item_id() {
        let mut store = WearableStore::new();
        let a = item(WearableType::Tattoo);
        let b = item(WearableType::Tattoo);
        store.push(WearableType::Tattoo, a).unwrap();
        store.push(WearableType::Tattoo, b.clone()).unwrap();
        let mut renamed = b.clone();
        renamed.name = "other".into();
        assert_eq!(store.index_of(&renamed), Some(1));
        assert_eq!(store.find_by_item(b.item_id), Some((WearableType::Tattoo, 1)));
        assert_eq!(store.find_by_asset(b.asset_id), Some(&b));
        assert!(store.is_wearing_item(b.item_id));
    }

    #[test]
    fn test_move_item() {
        let mut store = WearableStore::new();
        let inner = item(WearableType::Shirt);
        let outer = item(WearableType::Shirt);
        store.push(WearableType::Shirt, inner.clone()).unwrap();
        store.push(WearableType::Shirt, outer.clone()).unwrap();

        assert!(!store.can_move(inner.item_id, true));
        assert_eq!(store.move_item(inner.item_id, true), Ok(0));
        assert_eq!(store.move_item(outer.item_id, true), Ok(0));
        assert_eq!(store.bottom(WearableType::Shirt), Some(&outer));
        assert_eq!(store.top(WearableType::Shirt), Some(&inner));
    }

    #[test]
    fn test_rename_and_dirty() {
        let mut store = WearableStore::new();
        let shoes = item(WearableType::Shoes);
        store.push(WearableType::Shoes, shoes.clone()).unwrap();
        store.take_updates();

        store.rename_item(shoes.item_id, "Boots").unwrap();
        store.rename_item(shoes.item_id, "Boots").unwrap();
        store.mark_dirty(shoes.item_id).unwrap();
        assert_eq!(store.take_updates().len(), 2);

        let worn = store.get(WearableType::Shoes, 0).unwrap();
        assert_eq!(worn.name, "Boots");
        assert!(worn.dirty);
        let stranger = ItemId::generate();
        assert_eq!(
            store.rename_item(stranger, "x"),
            Err(StoreError::NotWorn(stranger))
        );
    }

    #[test]
    fn test_can_remove() {
        let store = declouded_store();
        let eyes = store.get(WearableType::Eyes, 0).unwrap().clone();
        assert!(!store.can_remove(&eyes));
        assert!(store.can_remove(&item(WearableType::Gloves)));
    }

    #[test]
    fn test_declouded_requires_all_body_parts() {
        let mut store = WearableStore::new();
        store.push(WearableType::Shape, item(WearableType::Shape)).unwrap();
        assert!(!store.update_declouded());
        assert!(declouded_store().declouded());
    }
}
