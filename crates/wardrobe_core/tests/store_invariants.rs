//! Integration tests for the wearable store invariants.

use wardrobe_core::{
    AssetId, ItemId, StoreError, WearableStore, WearableType, WornItem, MAX_PER_TYPE,
};

fn item(t: WearableType, name: &str) -> WornItem {
    WornItem::new(t, AssetId::generate(), ItemId::generate(), name)
}

fn dressed_store() -> WearableStore {
    let mut store = WearableStore::new();
    for t in WearableType::BODY_PARTS {
        store.push(t, item(t, t.name())).unwrap();
    }
    store.update_declouded();
    store.take_updates();
    store
}

#[test]
fn test_capacity_never_exceeded() {
    let mut store = dressed_store();
    for t in WearableType::ALL {
        for n in 0..MAX_PER_TYPE + 2 {
            let _ = store.push(t, item(t, &format!("{t} {n}")));
        }
        assert!(store.count(t) <= t.capacity(), "{t} over capacity");
    }
    assert_eq!(store.count(WearableType::Shape), 1);
    assert_eq!(store.count(WearableType::Alpha), MAX_PER_TYPE);
}

#[test]
fn test_body_parts_survive_every_public_removal() {
    let mut store = dressed_store();
    for t in WearableType::BODY_PARTS {
        assert_eq!(store.pop_at(t, 0), Err(StoreError::BodyPartRequired(t)));
        assert_eq!(
            store.remove_all_of_type(t),
            Err(StoreError::BodyPartRequired(t))
        );
        assert_eq!(store.count(t), 1);
    }
    assert!(store.take_updates().is_empty());
}

#[test]
fn test_body_parts_removable_before_decloud() {
    let mut store = WearableStore::new();
    store
        .push(WearableType::Eyes, item(WearableType::Eyes, "eyes"))
        .unwrap();
    assert!(store.pop_at(WearableType::Eyes, 0).is_ok());
}

#[test]
fn test_one_notification_per_mutation() {
    let mut store = dressed_store();
    let jacket = item(WearableType::Jacket, "Coat");
    store.push(WearableType::Jacket, jacket.clone()).unwrap();
    store.move_item(jacket.item_id, true).unwrap();
    store.pop_at(WearableType::Jacket, 0).unwrap();
    assert_eq!(
        store.take_updates(),
        vec![WearableType::Jacket, WearableType::Jacket]
    );
}

#[test]
fn test_nested_atomic_flushes_once() {
    let mut store = dressed_store();
    let new_hair = item(WearableType::Hair, "Bob");
    store.atomic(|outer| {
        outer.pop_at(WearableType::Hair, 0).unwrap();
        outer.atomic(|inner| {
            inner.push(WearableType::Hair, new_hair.clone()).unwrap();
            inner
                .push(WearableType::Gloves, item(WearableType::Gloves, "Mitts"))
                .unwrap();
        });
        assert!(!outer.has_pending_updates());
    });
    assert_eq!(
        store.take_updates(),
        vec![WearableType::Hair, WearableType::Gloves]
    );
    assert_eq!(store.top(WearableType::Hair), Some(&new_hair));
}

#[test]
fn test_iter_is_wire_ordered() {
    let store = dressed_store();
    let types: Vec<_> = store.iter().map(|(t, _)| t).collect();
    assert_eq!(types, WearableType::ALL.to_vec());
    assert_eq!(store.total_count(), 4);
}
