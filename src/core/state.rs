// src/core/state.rs

//! Defines the state shared between the command façade, the dispatcher, and
//! the reconnect coordinator.

use crate::connection::Credentials;
use crate::core::events::EventBus;
use crate::core::pubsub::{ListenerRegistry, SubscriptionRegistry};
use parking_lot::Mutex;

/// The recovery state machine of the single logical connection.
///
/// `Closed` is terminal and reached only by explicit application shutdown;
/// every other state can transition back to `Connected` through the
/// coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RecoveryState {
    Connected,
    Disconnected,
    Reauthenticating,
    Resubscribing,
    Closed,
}

/// The subscription registry bundled with the recovery state.
///
/// Both live under one mutex so that "inspect the connection state" and
/// "mutate the registry accordingly" form a single atomic step. The façade
/// relies on this to decide between sending a command and queueing a name
/// without racing the coordinator's transitions.
#[derive(Debug)]
pub struct SubscriptionState {
    pub registry: SubscriptionRegistry,
    pub recovery: RecoveryState,
}

/// State shared by all client components.
///
/// The mutexes here guard structural mutation and snapshots only; they are
/// never held across a listener callback or an `await` point.
#[derive(Debug)]
pub struct ClientState {
    /// The subscription registry and recovery state, mutated by the façade,
    /// the dispatcher (confirmations), and the coordinator (transitions).
    pub subs: Mutex<SubscriptionState>,
    /// The ordered collection of event observers.
    pub listeners: ListenerRegistry,
    /// Credentials recorded by a successful `AUTH`, replayed on reconnect.
    pub credentials: Mutex<Option<Credentials>>,
    /// The lifecycle event bus.
    pub events: EventBus,
}

impl ClientState {
    pub fn new(credentials: Option<Credentials>, event_bus_capacity: usize) -> Self {
        Self {
            subs: Mutex::new(SubscriptionState {
                registry: SubscriptionRegistry::new(),
                recovery: RecoveryState::Connected,
            }),
            listeners: ListenerRegistry::new(),
            credentials: Mutex::new(credentials),
            events: EventBus::new(event_bus_capacity),
        }
    }

    /// A snapshot of the current recovery state.
    pub fn recovery(&self) -> RecoveryState {
        self.subs.lock().recovery
    }
}
