//! # Outbound Messaging
//!
//! The appearance layer never talks to a socket. It hands finished payloads
//! to a [`MessagingChannel`]; the transport owns delivery.
//!
//! [`QueuedChannel`] is the stock implementation: payloads are queued under
//! a mutex and a transport thread drains them through a [`TransportHandle`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::protocol::Opcode;

/// Reliable outbound message sink.
pub trait MessagingChannel {
    /// Queues `payload` for reliable delivery. Payloads start with their
    /// opcode byte.
    fn send_reliable(&mut self, opcode: Opcode, payload: Vec<u8>);
}

/// A message waiting for the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Message opcode.
    pub opcode: Opcode,
    /// Encoded payload.
    pub payload: Vec<u8>,
}

struct Outbox {
    queue: Mutex<VecDeque<OutboundMessage>>,
    not_empty: Condvar,
}

impl Outbox {
    fn push(&self, message: OutboundMessage) {
        let mut queue = self.queue.lock();
        queue.push_back(message);
        self.not_empty.notify_one();
    }

    fn drain(&self, max_count: usize, timeout: Duration) -> Vec<OutboundMessage> {
        let mut queue = self.queue.lock();
        if queue.is_empty() && !timeout.is_zero() {
            self.not_empty.wait_for(&mut queue, timeout);
        }
        let count = queue.len().min(max_count);
        queue.drain(..count).collect()
    }
}

/// Channel that queues messages for a transport thread.
pub struct QueuedChannel {
    outbox: Arc<Outbox>,
}

impl QueuedChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            outbox: Arc::new(Outbox {
                queue: Mutex::new(VecDeque::new()),
                not_empty: Condvar::new(),
            }),
        }
    }

    /// Handle the transport drains from. Any number may exist.
    #[must_use]
    pub fn handle(&self) -> TransportHandle {
        TransportHandle {
            outbox: Arc::clone(&self.outbox),
        }
    }

    /// Messages not yet taken by the transport.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.outbox.queue.lock().len()
    }
}

impl Default for QueuedChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagingChannel for QueuedChannel {
    fn send_reliable(&mut self, opcode: Opcode, payload: Vec<u8>) {
        tracing::trace!(?opcode, bytes = payload.len(), "message queued");
        self.outbox.push(OutboundMessage { opcode, payload });
    }
}

/// Transport side of a [`QueuedChannel`].
#[derive(Clone)]
pub struct TransportHandle {
    outbox: Arc<Outbox>,
}

impl TransportHandle {
    /// Takes every queued message without waiting.
    #[must_use]
    pub fn try_drain(&self) -> Vec<OutboundMessage> {
        self.outbox.drain(usize::MAX, Duration::ZERO)
    }

    /// Takes up to `max_count` messages, waiting up to `timeout` for the
    /// first one.
    #[must_use]
    pub fn drain(&self, max_count: usize, timeout: Duration) -> Vec<OutboundMessage> {
        self.outbox.drain(max_count, timeout)
    }
}
