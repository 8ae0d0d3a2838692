//! # WARDROBE Networking
//!
//! Wire side of the appearance engine.
//!
//! ## Architecture
//!
//! - **Protocol**: opcodes, typed messages, payload writer/reader
//! - **Attachments**: bounded rez batches sharing one compound id
//! - **Wearables**: `AgentIsNowWearing` and login wearables parsing
//! - **Channel**: the outbound sink contract and a queued implementation
//!
//! The crate encodes and queues. Delivery, retransmission and sessions
//! belong to the transport that drains the channel.
//!
//! ## Example
//!
//! ```rust
//! use wardrobe_networking::{AttachmentBatcher, AttachmentItem, MessagingChannel, QueuedChannel};
//! use wardrobe_networking::protocol::{Opcode, PayloadWriter};
//! use wardrobe_core::ItemId;
//!
//! let items: Vec<AttachmentItem> = (0..6)
//!     .map(|i| AttachmentItem {
//!         item_id: ItemId::generate(),
//!         owner_id: uuid::Uuid::nil(),
//!         name: format!("ring {i}"),
//!         description: String::new(),
//!     })
//!     .collect();
//!
//! let mut channel = QueuedChannel::new();
//! let mut writer = PayloadWriter::new();
//! for packet in AttachmentBatcher::default().batch(&items, false, false) {
//!     let payload = writer.serialize_attachments(&packet).unwrap();
//!     channel.send_reliable(Opcode::RezMultipleAttachmentsFromInv, payload);
//! }
//! assert_eq!(channel.pending(), 2);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod attachments;
pub mod channel;
pub mod error;
pub mod protocol;
pub mod wearables;

pub use attachments::{batch_detach, AttachmentBatcher, AttachmentItem, BatcherConfig};
pub use channel::{MessagingChannel, OutboundMessage, QueuedChannel, TransportHandle};
pub use error::{ProtocolError, ProtocolResult};
pub use wearables::{now_wearing, parse_initial_wearables, InitialWearable};
