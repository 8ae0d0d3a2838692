//! # Appearance Protocol
//!
//! Binary encodings of the appearance messages.
//!
//! ## Payload Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Opcode (1)                                                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Fixed header, if any (Pod)                                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Count (1) │ Records (variable, max 4096 bytes total)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod opcodes;
mod packets;
mod serialization;

pub use opcodes::Opcode;
pub use packets::{
    AttachmentPacket, CachedTextureRequest, CachedTextureResponse, DetachRequest, InboundMessage,
    NowWearing, RezHeader, RezObject, WearablesUpdate, WireWearable,
};
pub use serialization::{PayloadReader, PayloadWriter, MAX_PAYLOAD_SIZE, MAX_STRING_BYTES};
