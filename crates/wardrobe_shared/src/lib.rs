//! # WARDROBE Shared
//!
//! Vocabulary shared by the appearance and networking crates.
//!
//! ## RULE
//!
//! Tables and plain data only. Anything that mutates a store or touches the
//! network belongs in `wardrobe_appearance` or `wardrobe_networking`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod bake;
pub mod constants;
pub mod events;
pub mod notifications;

pub use bake::{BakeRegion, Fingerprint};
pub use constants::{ATTACHMENT_ADD, MAX_ATTACHMENT_PACKETS, OBJECTS_PER_PACKET};
pub use events::{AppearanceEvent, EventType, RequestId};
