// src/core/pubsub/listener.rs

//! Defines the listener capability set and the ordered, mutation-safe
//! collection of registered listeners.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

/// The capability set of a pub/sub event observer.
///
/// Every method has a default no-op body, so a listener implements only the
/// callbacks it cares about and the rest fall through. Composition over a
/// partial implementation replaces the adapter-subclass idiom.
///
/// Callbacks run synchronously on the dispatcher's consumption path and are
/// expected to be short and non-blocking; a listener that needs long work is
/// responsible for offloading it. No registry lock is held while a callback
/// runs, so a listener may call subscribe/unsubscribe or add/remove listeners
/// re-entrantly.
pub trait PubSubListener: Send + Sync {
    /// A message arrived on an exactly-subscribed channel.
    fn on_message(&self, _channel: Bytes, _payload: Bytes) {}

    /// A message arrived on a channel matched by a subscribed pattern.
    fn on_pattern_message(&self, _pattern: Bytes, _channel: Bytes, _payload: Bytes) {}

    /// The server confirmed a channel subscription. `count` is the
    /// post-operation total as reported by the server.
    fn on_subscribed(&self, _channel: Bytes, _count: u64) {}

    /// The server confirmed a pattern subscription.
    fn on_psubscribed(&self, _pattern: Bytes, _count: u64) {}

    /// The server confirmed a channel unsubscription.
    fn on_unsubscribed(&self, _channel: Bytes, _count: u64) {}

    /// The server confirmed a pattern unsubscription.
    fn on_punsubscribed(&self, _pattern: Bytes, _count: u64) {}
}

/// An ordered collection of listener handles.
///
/// Registration order is dispatch order. Mutation is safe concurrently with
/// in-flight dispatch: the dispatcher fans out over a snapshot, so a listener
/// removed during dispatch of event N may still observe N, but is guaranteed
/// not to observe N+1.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn PubSubListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a listener. The registry holds a non-owning handle in the
    /// sense that dropping the application's clones plus removal here is what
    /// ends the listener's life; the registry never calls into it afterwards.
    pub fn add(&self, listener: Arc<dyn PubSubListener>) {
        self.listeners.lock().push(listener);
    }

    /// Removes a previously added listener, identified by handle identity.
    /// Returns true if it was present.
    pub fn remove(&self, listener: &Arc<dyn PubSubListener>) -> bool {
        let mut guard = self.listeners.lock();
        let before = guard.len();
        guard.retain(|l| !Arc::ptr_eq(l, listener));
        guard.len() != before
    }

    /// An ordered snapshot for fan-out. The lock is released before any
    /// callback runs.
    pub fn snapshot(&self) -> Vec<Arc<dyn PubSubListener>> {
        self.listeners.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}
