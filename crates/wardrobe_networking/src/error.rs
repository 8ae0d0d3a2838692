//! # Protocol Error Types
//!
//! Encoding and decoding failures for appearance messages.

use thiserror::Error;

use crate::protocol::Opcode;

/// Errors that can occur while building or parsing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The message does not fit in one payload buffer.
    #[error("{opcode:?} payload exceeds {limit} bytes")]
    PayloadTooLarge {
        /// Message being encoded.
        opcode: Opcode,
        /// Buffer size.
        limit: usize,
    },

    /// The payload ended before the message did.
    #[error("{0:?} payload truncated")]
    Truncated(Opcode),

    /// A wearable type index outside the known range.
    #[error("invalid wearable type index {0}")]
    InvalidTypeIndex(u8),

    /// The payload starts with an opcode we do not handle here.
    #[error("unexpected opcode {0}")]
    UnexpectedOpcode(u8),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
