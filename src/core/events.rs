// src/core/events.rs

//! Defines the event bus for propagating client lifecycle transitions to the
//! application.

use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::debug;

/// The default capacity of the lifecycle event broadcast channel.
/// Lifecycle transitions are rare, so a small buffer suffices.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 64;

/// A client lifecycle event observable by the application.
///
/// Connection-level problems surface here (and through listener callbacks),
/// never as errors thrown into unrelated call stacks.
#[derive(Debug, Clone, PartialEq, strum_macros::Display)]
pub enum ClientEvent {
    /// The link was lost; subscription state is retained for replay.
    Disconnected,
    /// A fresh link is up and previously recorded credentials are being replayed.
    Reauthenticating,
    /// The server rejected the recorded credentials during reconnect.
    /// Fatal for that reconnect attempt only; the next link retriggers recovery.
    AuthenticationFailed(String),
    /// Confirmed subscriptions are being reissued on the fresh link.
    Resubscribing,
    /// Recovery finished; all replay commands have been written.
    Connected,
    /// The client was shut down by the application. Terminal.
    Closed,
}

/// The `EventBus` is the distribution hub for `ClientEvent`s.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers. It's okay if there are none.
    pub fn publish(&self, event: ClientEvent) {
        if self.sender.send(event.clone()).is_err() {
            debug!("Published client event {event} with no active subscribers.");
        }
    }

    /// Provides a new receiver for an application task to observe lifecycle events.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUS_CAPACITY)
    }
}
