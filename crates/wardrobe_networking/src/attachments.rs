//! # Attachment Batching
//!
//! Splits an attachment rez request into bounded packets that share one
//! compound message id. The server reassembles the batch using the id and
//! the total object count carried by every packet.
//!
//! Limits: [`OBJECTS_PER_PACKET`] records per packet and
//! [`MAX_ATTACHMENT_PACKETS`] packets per request, never more than
//! [`MAX_OBJECTS_PER_REQUEST`] records in total. Items past the cap are
//! dropped and logged; the total count reflects what was actually sent.

use serde::Deserialize;
use uuid::Uuid;
use wardrobe_core::ItemId;
use wardrobe_shared::constants::{
    ATTACHMENT_DEFAULT_POINT, MAX_OBJECTS_PER_REQUEST, OBJECTS_PER_DETACH,
};
use wardrobe_shared::{ATTACHMENT_ADD, MAX_ATTACHMENT_PACKETS, OBJECTS_PER_PACKET};

use crate::protocol::{AttachmentPacket, DetachRequest, RezHeader, RezObject};

/// An inventory item to attach.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentItem {
    /// Inventory item id, links already resolved.
    pub item_id: ItemId,
    /// Owner of the item.
    pub owner_id: Uuid,
    /// Item name.
    pub name: String,
    /// Item description.
    pub description: String,
}

/// Batching limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BatcherConfig {
    /// Records per packet.
    pub objects_per_packet: usize,
    /// Packets per request.
    pub max_packets: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            objects_per_packet: OBJECTS_PER_PACKET,
            max_packets: MAX_ATTACHMENT_PACKETS,
        }
    }
}

impl BatcherConfig {
    /// Most items one request can carry with these limits, before the
    /// [`MAX_OBJECTS_PER_REQUEST`] cap.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.objects_per_packet.saturating_mul(self.max_packets)
    }
}

/// Builds attachment packets.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttachmentBatcher {
    config: BatcherConfig,
}

impl AttachmentBatcher {
    /// Creates a batcher. A zero `objects_per_packet` is treated as one.
    #[must_use]
    pub fn new(mut config: BatcherConfig) -> Self {
        config.objects_per_packet = config.objects_per_packet.max(1);
        Self { config }
    }

    /// Active limits.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Splits `items` into packets.
    ///
    /// With `detach_all` the first packet tells the server to detach
    /// everything attached now. With `replace` every record asks for the
    /// item's default attachment point; otherwise it carries the add flag.
    #[must_use]
    pub fn batch(
        &self,
        items: &[AttachmentItem],
        detach_all: bool,
        replace: bool,
    ) -> Vec<AttachmentPacket> {
        self.batch_with_id(items, detach_all, replace, Uuid::new_v4())
    }

    /// [`batch`](Self::batch) with a caller-chosen compound id.
    #[must_use]
    pub fn batch_with_id(
        &self,
        items: &[AttachmentItem],
        detach_all: bool,
        replace: bool,
        compound_msg_id: Uuid,
    ) -> Vec<AttachmentPacket> {
        if items.is_empty() {
            return Vec::new();
        }

        let capacity = self.config.capacity().min(MAX_OBJECTS_PER_REQUEST);
        let sent = items.len().min(capacity);
        if sent < items.len() {
            tracing::warn!(
                requested = items.len(),
                sent,
                dropped = items.len() - sent,
                "too many attachments in one request, excess dropped"
            );
        }

        let total_objects = u8::try_from(sent).unwrap_or(u8::MAX);
        let attachment_pt = if replace {
            ATTACHMENT_DEFAULT_POINT
        } else {
            ATTACHMENT_DEFAULT_POINT | ATTACHMENT_ADD
        };

        let packets: Vec<AttachmentPacket> = items[..sent]
            .chunks(self.config.objects_per_packet)
            .enumerate()
            .map(|(i, chunk)| AttachmentPacket {
                header: RezHeader::new(compound_msg_id, total_objects, detach_all && i == 0),
                objects: chunk
                    .iter()
                    .map(|item| RezObject {
                        item_id: item.item_id,
                        owner_id: item.owner_id,
                        attachment_pt,
                        name: item.name.clone(),
                        description: item.description.clone(),
                    })
                    .collect(),
            })
            .collect();

        tracing::debug!(
            %compound_msg_id,
            packets = packets.len(),
            objects = sent,
            detach_all,
            replace,
            "attachment batch built"
        );
        packets
    }
}

/// Splits local object ids into detach requests of at most `limit` ids
/// (capped at [`OBJECTS_PER_DETACH`]).
#[must_use]
pub fn batch_detach(local_ids: &[u32], limit: usize) -> Vec<DetachRequest> {
    let limit = limit.clamp(1, OBJECTS_PER_DETACH);
    local_ids
        .chunks(limit)
        .map(|chunk| DetachRequest {
            local_ids: chunk.to_vec(),
        })
        .collect()
}
