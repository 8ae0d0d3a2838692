//! # Appearance Event Bus
//!
//! Carries [`AppearanceEvent`]s from the engine to whoever renders, saves
//! or reports appearance changes.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │   Engine    │─────>│   Event     │─────>│  Renderer,  │
//! │   (pump)    │      │   Channel   │      │  UI, bakes  │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! The channel is bounded. When it is full new events are dropped rather
//! than stalling the engine.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use wardrobe_shared::AppearanceEvent;

/// Event bus for appearance events.
pub struct EventBus {
    sender: Sender<AppearanceEvent>,
    receiver: Receiver<AppearanceEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle. Receivers share one queue: each event is
    /// delivered to exactly one of them.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<AppearanceEvent>,
}

impl EventSender {
    /// Sends an event without blocking.
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: AppearanceEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event_type = ?event.event_type(), "event bus full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<AppearanceEvent>,
}

impl EventReceiver {
    /// Receives all pending events without blocking.
    #[inline]
    pub fn drain(&self) -> Vec<AppearanceEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event, `None` if none is pending.
    #[inline]
    pub fn try_recv(&self) -> Option<AppearanceEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardrobe_core::WearableType;

    fn changed(t: WearableType) -> AppearanceEvent {
        AppearanceEvent::WearableChanged { wearable_type: t }
    }

    #[test]
    fn test_events_in_order() {
        let bus = EventBus::new(8);
        let sender = bus.sender();
        let receiver = bus.receiver();
        assert!(sender.send(changed(WearableType::Shirt)));
        assert!(sender.send(changed(WearableType::Pants)));
        assert_eq!(receiver.pending_count(), 2);
        assert_eq!(
            receiver.drain(),
            vec![changed(WearableType::Shirt), changed(WearableType::Pants)]
        );
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(1);
        let sender = bus.sender();
        assert!(sender.send(changed(WearableType::Hair)));
        assert!(!sender.send(changed(WearableType::Eyes)));
        assert_eq!(bus.receiver().try_recv(), Some(changed(WearableType::Hair)));
        assert_eq!(bus.receiver().try_recv(), None);
    }
}
