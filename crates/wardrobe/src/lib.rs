//! # WARDROBE
//!
//! Avatar appearance composition and synchronization.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          APPEARANCE ENGINE                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │   CORE          │     │   APPEARANCE    │     │   NETWORKING    │   │
//! │  │                 │<────│                 │────>│                 │   │
//! │  │  • Types        │     │  • Resolver     │     │  • Opcodes      │   │
//! │  │  • Store        │     │  • Composer     │     │  • Attachments  │   │
//! │  │  • Invariants   │     │  • Fingerprints │     │  • Channel      │   │
//! │  └─────────────────┘     └─────────────────┘     └─────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `engine`: The per-session [`AppearanceEngine`]
//! - `events`: Bounded event bus for [`AppearanceEvent`]s
//! - `config`: TOML session configuration

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod engine;
pub mod error;
pub mod events;

// Re-export the layers
pub use wardrobe_appearance as appearance;
pub use wardrobe_core as core;
pub use wardrobe_networking as networking;
pub use wardrobe_shared as shared;

// Re-export commonly used types
pub use config::{AppearanceConfig, EventConfig};
pub use engine::{AppearanceEngine, Collaborators, InboundOutcome};
pub use error::{ConfigError, ConfigResult, EngineError, EngineResult};
pub use events::{EventBus, EventReceiver, EventSender};
pub use wardrobe_shared::AppearanceEvent;
