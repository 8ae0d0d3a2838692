//! # Appearance Messages
//!
//! Typed forms of the messages exchanged with the simulator. Fixed-size
//! parts are `Pod` so they can be copied straight into the payload.

use bytemuck::{Pod, Zeroable};
use uuid::Uuid;
use wardrobe_core::{AssetId, ItemId, WearableType};
use wardrobe_shared::Fingerprint;

use super::Opcode;
use crate::error::{ProtocolError, ProtocolResult};

/// Fixed header of a `RezMultipleAttachmentsFromInv` packet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RezHeader {
    /// Id shared by every packet of one batch.
    pub compound_msg_id: [u8; 16],
    /// Objects in the whole batch, not just this packet.
    pub total_objects: u8,
    /// Non-zero on the first packet of a replacing batch only.
    pub first_detach_all: u8,
}

impl RezHeader {
    /// Creates a header.
    #[must_use]
    pub fn new(compound_msg_id: Uuid, total_objects: u8, first_detach_all: bool) -> Self {
        Self {
            compound_msg_id: *compound_msg_id.as_bytes(),
            total_objects,
            first_detach_all: u8::from(first_detach_all),
        }
    }

    /// Compound id as a UUID.
    #[inline]
    #[must_use]
    pub const fn compound_msg_id(&self) -> Uuid {
        Uuid::from_bytes(self.compound_msg_id)
    }

    /// Whether the receiver must detach everything first.
    #[inline]
    #[must_use]
    pub const fn detach_all(&self) -> bool {
        self.first_detach_all != 0
    }
}

/// One object in a rez packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RezObject {
    /// Inventory item to rez.
    pub item_id: ItemId,
    /// Item owner.
    pub owner_id: Uuid,
    /// Attachment point byte. Bit 0x80 means "add".
    pub attachment_pt: u8,
    /// Item name.
    pub name: String,
    /// Item description.
    pub description: String,
}

/// One `RezMultipleAttachmentsFromInv` packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentPacket {
    /// Batch header.
    pub header: RezHeader,
    /// Objects carried by this packet.
    pub objects: Vec<RezObject>,
}

/// `AgentIsNowWearing`: the layer-0 item of every type. Empty types carry
/// a nil item id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NowWearing {
    /// `(item, type)` pairs in type order.
    pub entries: Vec<(ItemId, WearableType)>,
}

/// One wearable block of an `AgentWearablesUpdate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WireWearable {
    /// Inventory item.
    pub item_id: ItemId,
    /// Asset, null when the slot is empty.
    pub asset_id: AssetId,
    /// Raw type byte.
    pub type_index: u8,
}

impl WireWearable {
    /// Validated wearable type.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidTypeIndex`] for an out of range byte.
    pub fn wearable_type(&self) -> ProtocolResult<WearableType> {
        WearableType::from_u8(self.type_index).ok_or(ProtocolError::InvalidTypeIndex(self.type_index))
    }
}

/// `AgentWearablesUpdate`: wearables the server has on record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WearablesUpdate {
    /// Server serial, increases per update.
    pub serial: u32,
    /// Wearable blocks in server order.
    pub wearables: Vec<WireWearable>,
}

/// `AgentCachedTexture`: fingerprints to look up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedTextureRequest {
    /// Query serial.
    pub serial: u32,
    /// `(fingerprint, baked texture index)` pairs.
    pub entries: Vec<(Fingerprint, u8)>,
}

/// `AgentCachedTextureResponse`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedTextureResponse {
    /// Serial echoed from the request.
    pub serial: u32,
    /// `(baked texture index, texture)` pairs, nil texture on a miss.
    pub entries: Vec<(u8, Uuid)>,
}

/// `ObjectDetach`: local ids of objects to take off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetachRequest {
    /// Object local ids.
    pub local_ids: Vec<u32>,
}

/// Messages the appearance layer receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundMessage {
    /// Login wearables.
    WearablesUpdate(WearablesUpdate),
    /// Bake cache answer.
    CachedTextureResponse(CachedTextureResponse),
}

impl InboundMessage {
    /// Opcode of this message.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::WearablesUpdate(_) => Opcode::AgentWearablesUpdate,
            Self::CachedTextureResponse(_) => Opcode::AgentCachedTextureResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rez_header_size() {
        assert_eq!(std::mem::size_of::<RezHeader>(), 18);
    }

    #[test]
    fn test_rez_header_fields() {
        let id = Uuid::new_v4();
        let header = RezHeader::new(id, 7, true);
        assert_eq!(header.compound_msg_id(), id);
        assert!(header.detach_all());
        assert!(!RezHeader::new(id, 7, false).detach_all());
    }

    #[test]
    fn test_wire_wearable_type() {
        let mut wire = WireWearable {
            item_id: ItemId::generate(),
            asset_id: AssetId::NULL,
            type_index: 3,
        };
        assert_eq!(wire.wearable_type(), Ok(WearableType::Eyes));
        wire.type_index = 200;
        assert_eq!(wire.wearable_type(), Err(ProtocolError::InvalidTypeIndex(200)));
    }
}
