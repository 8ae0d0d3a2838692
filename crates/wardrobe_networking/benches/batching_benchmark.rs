//! Attachment batching and encoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uuid::Uuid;
use wardrobe_core::ItemId;
use wardrobe_networking::protocol::PayloadWriter;
use wardrobe_networking::{AttachmentBatcher, AttachmentItem};

fn items(n: usize) -> Vec<AttachmentItem> {
    (0..n)
        .map(|i| AttachmentItem {
            item_id: ItemId::generate(),
            owner_id: Uuid::new_v4(),
            name: format!("Attachment {i}"),
            description: String::from("@2800"),
        })
        .collect()
}

fn bench_batch(c: &mut Criterion) {
    let batcher = AttachmentBatcher::default();
    let input = items(40);
    c.bench_function("batch_40_attachments", |b| {
        b.iter(|| batcher.batch(black_box(&input), true, false));
    });
}

fn bench_encode(c: &mut Criterion) {
    let packets = AttachmentBatcher::default().batch(&items(40), false, false);
    let mut writer = PayloadWriter::new();
    c.bench_function("encode_attachment_packets", |b| {
        b.iter(|| {
            for packet in &packets {
                black_box(writer.serialize_attachments(packet).ok());
            }
        });
    });
}

criterion_group!(benches, bench_batch, bench_encode);
criterion_main!(benches);
