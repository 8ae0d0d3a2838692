//! # Payload Serialization
//!
//! Writes and reads appearance messages.
//!
//! ## Design
//!
//! - One reusable fixed buffer per writer, no allocation while encoding
//! - Little-endian integers, ids as raw 16 bytes
//! - Strings carry a one byte length prefix and are cut at 255 bytes
//! - Every payload starts with its opcode byte

use bytemuck::{bytes_of, Pod};
use uuid::Uuid;
use wardrobe_core::{AssetId, ItemId, WearableType};
use wardrobe_shared::Fingerprint;

use super::packets::{
    AttachmentPacket, CachedTextureRequest, CachedTextureResponse, DetachRequest, InboundMessage,
    NowWearing, RezHeader, RezObject, WearablesUpdate, WireWearable,
};
use super::Opcode;
use crate::error::{ProtocolError, ProtocolResult};

/// Maximum payload size.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Longest string a length prefix can describe.
pub const MAX_STRING_BYTES: usize = u8::MAX as usize;

/// Payload writer over a pre-allocated buffer.
///
/// Reuse one writer across messages to avoid allocations.
pub struct PayloadWriter {
    buffer: [u8; MAX_PAYLOAD_SIZE],
    position: usize,
}

impl PayloadWriter {
    /// Creates a writer with a fresh buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_PAYLOAD_SIZE],
            position: 0,
        }
    }

    /// Resets the writer for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.position
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.position + bytes.len() > MAX_PAYLOAD_SIZE {
            return false;
        }
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        true
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> bool {
        self.write_bytes(&[value])
    }

    /// Writes a u32 in little-endian format.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> bool {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes a UUID as 16 raw bytes.
    #[inline]
    pub fn write_uuid(&mut self, value: &Uuid) -> bool {
        self.write_bytes(value.as_bytes())
    }

    /// Writes a length-prefixed string, cut at a char boundary if longer
    /// than [`MAX_STRING_BYTES`].
    pub fn write_str(&mut self, value: &str) -> bool {
        let mut end = value.len().min(MAX_STRING_BYTES);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        if end < value.len() {
            tracing::trace!(len = value.len(), "string field truncated");
        }
        let bytes = &value.as_bytes()[..end];
        u8::try_from(end).is_ok_and(|len| self.write_u8(len)) && self.write_bytes(bytes)
    }

    /// Writes a Pod type directly.
    #[inline]
    pub fn write_pod<T: Pod>(&mut self, value: &T) -> bool {
        self.write_bytes(bytes_of(value))
    }

    /// Writes a count byte, refusing counts that do not fit.
    fn write_count(&mut self, count: usize) -> bool {
        u8::try_from(count).is_ok_and(|c| self.write_u8(c))
    }

    fn finish(&self, opcode: Opcode, ok: bool) -> ProtocolResult<Vec<u8>> {
        if ok {
            Ok(self.as_slice().to_vec())
        } else {
            Err(ProtocolError::PayloadTooLarge {
                opcode,
                limit: MAX_PAYLOAD_SIZE,
            })
        }
    }

    fn write_rez_object(&mut self, object: &RezObject) -> bool {
        self.write_bytes(object.item_id.as_bytes())
            && self.write_uuid(&object.owner_id)
            && self.write_u8(object.attachment_pt)
            && self.write_str(&object.name)
            && self.write_str(&object.description)
    }

    /// Serializes one attachment rez packet.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`] if the packet does not fit.
    pub fn serialize_attachments(&mut self, packet: &AttachmentPacket) -> ProtocolResult<Vec<u8>> {
        self.reset();
        let ok = self.write_u8(Opcode::RezMultipleAttachmentsFromInv as u8)
            && self.write_pod(&packet.header)
            && self.write_count(packet.objects.len())
            && packet.objects.iter().all(|o| self.write_rez_object(o));
        self.finish(Opcode::RezMultipleAttachmentsFromInv, ok)
    }

    /// Serializes a detach packet.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`] if the id list does not fit.
    pub fn serialize_detach(&mut self, request: &DetachRequest) -> ProtocolResult<Vec<u8>> {
        self.reset();
        let ok = self.write_u8(Opcode::ObjectDetach as u8)
            && self.write_count(request.local_ids.len())
            && request.local_ids.iter().all(|id| self.write_u32(*id));
        self.finish(Opcode::ObjectDetach, ok)
    }

    /// Serializes an `AgentIsNowWearing` message.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`] if the message does not fit.
    pub fn serialize_now_wearing(&mut self, message: &NowWearing) -> ProtocolResult<Vec<u8>> {
        self.reset();
        let ok = self.write_u8(Opcode::AgentIsNowWearing as u8)
            && self.write_count(message.entries.len())
            && message
                .entries
                .iter()
                .all(|(item, t)| self.write_bytes(item.as_bytes()) && self.write_u8(t.as_u8()));
        self.finish(Opcode::AgentIsNowWearing, ok)
    }

    /// Serializes a bake cache query.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`] if the message does not fit.
    pub fn serialize_cache_request(&mut self, request: &CachedTextureRequest) -> ProtocolResult<Vec<u8>> {
        self.reset();
        let ok = self.write_u8(Opcode::AgentCachedTexture as u8)
            && self.write_u32(request.serial)
            && self.write_count(request.entries.len())
            && request
                .entries
                .iter()
                .all(|(fp, index)| self.write_bytes(fp.as_bytes()) && self.write_u8(*index));
        self.finish(Opcode::AgentCachedTexture, ok)
    }

    /// Serializes a bake cache response. Normally the server's job, kept
    /// for loopback transports and tests.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`] if the message does not fit.
    pub fn serialize_cache_response(&mut self, response: &CachedTextureResponse) -> ProtocolResult<Vec<u8>> {
        self.reset();
        let ok = self.write_u8(Opcode::AgentCachedTextureResponse as u8)
            && self.write_u32(response.serial)
            && self.write_count(response.entries.len())
            && response
                .entries
                .iter()
                .all(|(index, texture)| self.write_u8(*index) && self.write_uuid(texture));
        self.finish(Opcode::AgentCachedTextureResponse, ok)
    }

    /// Serializes a wearables update. Server side, kept for loopback
    /// transports and tests.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`] if the message does not fit.
    pub fn serialize_wearables_update(&mut self, update: &WearablesUpdate) -> ProtocolResult<Vec<u8>> {
        self.reset();
        let ok = self.write_u8(Opcode::AgentWearablesUpdate as u8)
            && self.write_u32(update.serial)
            && self.write_count(update.wearables.len())
            && update.wearables.iter().all(|w| {
                self.write_bytes(w.item_id.as_bytes())
                    && self.write_bytes(w.asset_id.as_bytes())
                    && self.write_u8(w.type_index)
            });
        self.finish(Opcode::AgentWearablesUpdate, ok)
    }
}

impl Default for PayloadWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload reader over a received buffer.
pub struct PayloadReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PayloadReader<'a> {
    /// Creates a reader from a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Reads `N` raw bytes.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.buffer.get(self.position..self.position + N)?;
        self.position += N;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Some(out)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    /// Reads a u32 in little-endian format.
    #[inline]
    pub fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Reads a UUID.
    #[inline]
    pub fn read_uuid(&mut self) -> Option<Uuid> {
        self.read_array().map(Uuid::from_bytes)
    }

    /// Reads a length-prefixed string. Invalid UTF-8 is replaced.
    pub fn read_str(&mut self) -> Option<String> {
        let len = usize::from(self.read_u8()?);
        let slice = self.buffer.get(self.position..self.position + len)?;
        self.position += len;
        Some(String::from_utf8_lossy(slice).into_owned())
    }

    /// Reads a Pod type directly.
    #[inline]
    pub fn read_pod<T: Pod + Copy>(&mut self) -> Option<T> {
        let size = std::mem::size_of::<T>();
        let slice = self.buffer.get(self.position..self.position + size)?;
        self.position += size;
        bytemuck::try_pod_read_unaligned(slice).ok()
    }

    /// Deserializes an inbound appearance message.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnexpectedOpcode`] for outbound or unknown opcodes,
    /// [`ProtocolError::Truncated`] if the payload ends early.
    pub fn deserialize(&mut self) -> ProtocolResult<InboundMessage> {
        let byte = self.read_u8().ok_or(ProtocolError::UnexpectedOpcode(0))?;
        match Opcode::from_u8(byte) {
            Some(Opcode::AgentWearablesUpdate) => self
                .read_wearables_update()
                .map(InboundMessage::WearablesUpdate)
                .ok_or(ProtocolError::Truncated(Opcode::AgentWearablesUpdate)),
            Some(Opcode::AgentCachedTextureResponse) => self
                .read_cache_response()
                .map(InboundMessage::CachedTextureResponse)
                .ok_or(ProtocolError::Truncated(Opcode::AgentCachedTextureResponse)),
            _ => Err(ProtocolError::UnexpectedOpcode(byte)),
        }
    }

    fn read_wearables_update(&mut self) -> Option<WearablesUpdate> {
        let serial = self.read_u32()?;
        let count = self.read_u8()?;
        let mut wearables = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            wearables.push(WireWearable {
                item_id: ItemId::from_bytes(self.read_array()?),
                asset_id: AssetId::from_bytes(self.read_array()?),
                type_index: self.read_u8()?,
            });
        }
        Some(WearablesUpdate { serial, wearables })
    }

    fn read_cache_response(&mut self) -> Option<CachedTextureResponse> {
        let serial = self.read_u32()?;
        let count = self.read_u8()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let index = self.read_u8()?;
            entries.push((index, self.read_uuid()?));
        }
        Some(CachedTextureResponse { serial, entries })
    }

    /// Reads back an attachment packet, opcode byte included. Used by
    /// loopback transports.
    pub fn read_attachment_packet(&mut self) -> Option<AttachmentPacket> {
        if self.read_u8()? != Opcode::RezMultipleAttachmentsFromInv as u8 {
            return None;
        }
        let header = self.read_pod::<RezHeader>()?;
        let count = self.read_u8()?;
        let mut objects = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            objects.push(RezObject {
                item_id: ItemId::from_bytes(self.read_array()?),
                owner_id: self.read_uuid()?,
                attachment_pt: self.read_u8()?,
                name: self.read_str()?,
                description: self.read_str()?,
            });
        }
        Some(AttachmentPacket { header, objects })
    }

    /// Reads back a cache query, opcode byte included.
    pub fn read_cache_request(&mut self) -> Option<CachedTextureRequest> {
        if self.read_u8()? != Opcode::AgentCachedTexture as u8 {
            return None;
        }
        let serial = self.read_u32()?;
        let count = self.read_u8()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let fingerprint = Fingerprint::from_bytes(self.read_array()?);
            entries.push((fingerprint, self.read_u8()?));
        }
        Some(CachedTextureRequest { serial, entries })
    }

    /// Reads back an `AgentIsNowWearing`, opcode byte included.
    pub fn read_now_wearing(&mut self) -> Option<NowWearing> {
        if self.read_u8()? != Opcode::AgentIsNowWearing as u8 {
            return None;
        }
        let count = self.read_u8()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let item = ItemId::from_bytes(self.read_array()?);
            entries.push((item, WearableType::from_u8(self.read_u8()?)?));
        }
        Some(NowWearing { entries })
    }

    /// Reads back a detach packet, opcode byte included.
    pub fn read_detach(&mut self) -> Option<DetachRequest> {
        if self.read_u8()? != Opcode::ObjectDetach as u8 {
            return None;
        }
        let count = self.read_u8()?;
        let local_ids = (0..count).map(|_| self.read_u32()).collect::<Option<Vec<_>>>()?;
        Some(DetachRequest { local_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str) -> RezObject {
        RezObject {
            item_id: ItemId::generate(),
            owner_id: Uuid::new_v4(),
            attachment_pt: 0x80,
            name: name.to_string(),
            description: "@2800".to_string(),
        }
    }

    #[test]
    fn test_attachment_packet_layout() {
        let packet = AttachmentPacket {
            header: RezHeader::new(Uuid::new_v4(), 2, true),
            objects: vec![object("hat"), object("ring")],
        };
        let mut writer = PayloadWriter::new();
        let bytes = writer.serialize_attachments(&packet).unwrap();
        assert_eq!(bytes[0], Opcode::RezMultipleAttachmentsFromInv as u8);
        // opcode + header + count + 2 * (16 + 16 + 1 + (1 + name) + (1 + 5))
        assert_eq!(bytes.len(), 1 + 18 + 1 + (40 + 3) + (40 + 4));

        let back = PayloadReader::new(&bytes).read_attachment_packet().unwrap();
        assert_eq!(back, packet);
    }

    #[test]
    fn test_long_string_truncated_on_char_boundary() {
        let long = "é".repeat(200);
        let mut writer = PayloadWriter::new();
        assert!(writer.write_str(&long));
        let mut reader = PayloadReader::new(writer.as_slice());
        let back = reader.read_str().unwrap();
        assert_eq!(back.len(), 254);
        assert!(long.starts_with(&back));
    }

    #[test]
    fn test_buffer_overflow_reported() {
        let request = DetachRequest {
            local_ids: vec![7; 300],
        };
        let mut writer = PayloadWriter::new();
        assert_eq!(
            writer.serialize_detach(&request),
            Err(ProtocolError::PayloadTooLarge {
                opcode: Opcode::ObjectDetach,
                limit: MAX_PAYLOAD_SIZE
            })
        );
    }

    #[test]
    fn test_inbound_wearables_update() {
        let update = WearablesUpdate {
            serial: 9,
            wearables: vec![WireWearable {
                item_id: ItemId::generate(),
                asset_id: AssetId::generate(),
                type_index: 0,
            }],
        };
        let mut writer = PayloadWriter::new();
        let bytes = writer.serialize_wearables_update(&update).unwrap();
        assert_eq!(
            PayloadReader::new(&bytes).deserialize(),
            Ok(InboundMessage::WearablesUpdate(update))
        );
    }

    #[test]
    fn test_truncated_and_outbound_rejected() {
        let response = CachedTextureResponse {
            serial: 1,
            entries: vec![(8, Uuid::new_v4())],
        };
        let mut writer = PayloadWriter::new();
        let bytes = writer.serialize_cache_response(&response).unwrap();
        assert_eq!(
            PayloadReader::new(&bytes[..bytes.len() - 1]).deserialize(),
            Err(ProtocolError::Truncated(Opcode::AgentCachedTextureResponse))
        );
        let detach = writer
            .serialize_detach(&DetachRequest { local_ids: vec![1] })
            .unwrap();
        assert_eq!(
            PayloadReader::new(&detach).deserialize(),
            Err(ProtocolError::UnexpectedOpcode(Opcode::ObjectDetach as u8))
        );
    }
}
