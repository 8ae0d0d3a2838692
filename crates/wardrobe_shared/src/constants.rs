//! # Protocol Constants
//!
//! Limits shared with the simulator. Changing any of these breaks
//! compatibility with the server.

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// Attachment records per rez packet.
pub const OBJECTS_PER_PACKET: usize = 4;

/// Maximum rez packets per request. Anything beyond is dropped.
pub const MAX_ATTACHMENT_PACKETS: usize = 10;

/// Objects one attachment request can describe; the total count travels
/// in a single byte.
pub const MAX_OBJECTS_PER_REQUEST: usize = 255;

/// Attachment point flag: add to the point instead of replacing.
pub const ATTACHMENT_ADD: u8 = 0x80;

/// Attachment point 0 lets the server pick the item's default point.
pub const ATTACHMENT_DEFAULT_POINT: u8 = 0;

/// Local object ids per detach packet.
pub const OBJECTS_PER_DETACH: usize = 255;

// =============================================================================
// WEARABLES
// =============================================================================

/// An initial wearables update with fewer blocks cannot describe all body
/// parts and is ignored.
pub const MIN_INITIAL_WEARABLE_BLOCKS: usize = 4;

/// Prefix of the layer-order marker stored in item descriptions.
pub const ORDER_NUMBER_SEPARATOR: char = '@';

/// Multiplier separating the type from the layer index in order numbers.
pub const ORDER_TYPE_STRIDE: u32 = 100;

// =============================================================================
// RESOLVER DEFAULTS
// =============================================================================

/// Default outfit request timeout in milliseconds.
pub const DEFAULT_RESOLVER_TIMEOUT_MS: u64 = 30_000;

/// Default number of retries for a transient asset fetch failure.
pub const DEFAULT_MAX_FETCH_RETRIES: u32 = 3;
