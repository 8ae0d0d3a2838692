//! Benchmark for bake fingerprints and outfit composition.
//!
//! Run with: cargo bench --package wardrobe_appearance --bench fingerprint_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use uuid::Uuid;
use wardrobe_appearance::{
    compute_fingerprint, AppearanceComposer, AssetData, InventoryIndex, ItemRecord, OutfitEntry,
    RegionFingerprints, ResolvedEntry, ResolvedOutfit,
};
use wardrobe_core::{AssetId, ItemId, WearableStore, WearableType, WornItem, MAX_PER_TYPE};
use wardrobe_shared::{BakeRegion, RequestId};

struct Inventory(HashMap<ItemId, ItemRecord>);

impl InventoryIndex for Inventory {
    fn get_item(&self, item_id: ItemId) -> Option<ItemRecord> {
        self.0.get(&item_id).cloned()
    }
}

fn full_store() -> WearableStore {
    let mut store = WearableStore::new();
    for t in WearableType::ALL {
        for _ in 0..t.capacity().min(MAX_PER_TYPE) {
            let _ = store.push(t, WornItem::new(t, AssetId::generate(), ItemId::generate(), t.name()));
        }
    }
    store
}

fn benchmark_fingerprints(c: &mut Criterion) {
    let store = full_store();

    c.bench_function("fingerprint_lower_body", |b| {
        b.iter(|| compute_fingerprint(black_box(&store), BakeRegion::LowerBody));
    });

    c.bench_function("fingerprint_all_regions", |b| {
        b.iter(|| RegionFingerprints::compute(black_box(&store)));
    });
}

fn benchmark_compose(c: &mut Criterion) {
    let mut records = HashMap::new();
    let mut entries = Vec::new();
    for t in WearableType::ALL {
        let entry = OutfitEntry::new(ItemId::generate(), AssetId::generate(), t);
        records.insert(
            entry.item_id,
            ItemRecord {
                item_id: entry.item_id,
                asset_id: entry.asset_id,
                linked_item_id: None,
                wearable_type: Some(t),
                name: t.name().to_owned(),
                description: String::new(),
                owner_id: Uuid::nil(),
            },
        );
        entries.push(ResolvedEntry {
            entry,
            outcome: Ok(AssetData {
                asset_id: entry.asset_id,
                wearable_type: t,
                name: String::new(),
            }),
        });
    }
    let inventory = Inventory(records);
    let outfit = ResolvedOutfit {
        request_id: RequestId(1),
        entries,
        append: false,
        replace: false,
    };
    let composer = AppearanceComposer::default();

    c.bench_function("compose_full_outfit", |b| {
        b.iter(|| {
            let mut store = WearableStore::new();
            composer.compose(black_box(&outfit), &mut store, &inventory)
        });
    });
}

criterion_group!(benches, benchmark_fingerprints, benchmark_compose);
criterion_main!(benches);
