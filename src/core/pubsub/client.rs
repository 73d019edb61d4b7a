// src/core/pubsub/client.rs

//! The public command façade: subscribe-family operations, introspection
//! queries, listener registration, and shutdown.

use crate::config::PubSubConfig;
use crate::connection::{ConnectionEvent, Credentials, PubSubCommand, QueryCommand, Transport};
use crate::core::PeridotError;
use crate::core::events::ClientEvent;
use crate::core::protocol::{PushFrame, Reply};
use crate::core::pubsub::{Dispatcher, PubSubListener, ReconnectCoordinator};
use crate::core::state::{ClientState, RecoveryState};
use bytes::Bytes;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// The pub/sub half of a client connection.
///
/// Owns the subscription and listener registries for its lifetime and drives
/// two background tasks: the dispatcher (push frame consumption) and the
/// reconnect coordinator (lifecycle observation and replay).
///
/// Subscribe-family operations are fire-and-forget: they validate, update the
/// registry, write one wire command, and return. Confirmations surface later
/// through listener callbacks. Only the introspection queries block for a
/// reply.
pub struct PubSubClient {
    state: Arc<ClientState>,
    transport: Arc<dyn Transport>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PubSubClient {
    /// Creates a client over an established connection and spawns its
    /// dispatcher and reconnect coordinator tasks.
    ///
    /// `frames` is the connection's decoded push-frame stream, consumed
    /// exactly once in arrival order. `lifecycle` reports link loss and
    /// recovery; retry/backoff policy belongs to the connection layer.
    pub fn new(
        transport: Arc<dyn Transport>,
        frames: mpsc::UnboundedReceiver<PushFrame>,
        lifecycle: broadcast::Receiver<ConnectionEvent>,
        config: PubSubConfig,
    ) -> Self {
        let state = Arc::new(ClientState::new(
            config.credentials(),
            config.event_bus_capacity,
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        let dispatcher = Dispatcher::new(state.clone(), frames, shutdown_tx.subscribe());
        tokio::spawn(dispatcher.run());

        let coordinator = ReconnectCoordinator::new(
            state.clone(),
            transport.clone(),
            lifecycle,
            shutdown_tx.subscribe(),
        );
        tokio::spawn(coordinator.run());

        Self {
            state,
            transport,
            shutdown_tx,
        }
    }

    /// Subscribes to one or more channels.
    ///
    /// Sends exactly one wire command covering all names and returns without
    /// waiting for confirmations. While disconnected, the names are queued
    /// and replayed when the link returns.
    pub async fn subscribe(&self, channels: &[Bytes]) -> Result<(), PeridotError> {
        validate_names(channels, "subscribe")?;
        let send = {
            let mut subs = self.state.subs.lock();
            match subs.recovery {
                RecoveryState::Closed => return Err(PeridotError::ConnectionClosed),
                RecoveryState::Connected => {
                    for channel in channels {
                        subs.registry.note_channel_sent(channel);
                    }
                    true
                }
                _ => {
                    for channel in channels {
                        subs.registry.queue_channel(channel);
                    }
                    false
                }
            }
        };
        if send {
            self.transport
                .send(PubSubCommand::Subscribe(channels.to_vec()))
                .await?;
        }
        Ok(())
    }

    /// Subscribes to one or more glob patterns (`*`, `?`, character classes).
    /// Pattern matching against published channels happens on the server.
    pub async fn psubscribe(&self, patterns: &[Bytes]) -> Result<(), PeridotError> {
        validate_names(patterns, "psubscribe")?;
        let send = {
            let mut subs = self.state.subs.lock();
            match subs.recovery {
                RecoveryState::Closed => return Err(PeridotError::ConnectionClosed),
                RecoveryState::Connected => {
                    for pattern in patterns {
                        subs.registry.note_pattern_sent(pattern);
                    }
                    true
                }
                _ => {
                    for pattern in patterns {
                        subs.registry.queue_pattern(pattern);
                    }
                    false
                }
            }
        };
        if send {
            self.transport
                .send(PubSubCommand::PSubscribe(patterns.to_vec()))
                .await?;
        }
        Ok(())
    }

    /// Unsubscribes from the given channels, or from all currently desired
    /// channels when called with an empty slice (a snapshot taken at call
    /// time). While disconnected this only trims the replay set.
    pub async fn unsubscribe(&self, channels: &[Bytes]) -> Result<(), PeridotError> {
        validate_optional_names(channels)?;
        let (names, send) = {
            let mut subs = self.state.subs.lock();
            if subs.recovery == RecoveryState::Closed {
                return Err(PeridotError::ConnectionClosed);
            }
            let names = if channels.is_empty() {
                subs.registry.channel_names()
            } else {
                channels.to_vec()
            };
            for name in &names {
                subs.registry.remove_channel(name);
            }
            (names, subs.recovery == RecoveryState::Connected)
        };
        if send {
            self.transport
                .send(PubSubCommand::Unsubscribe(names))
                .await?;
        }
        Ok(())
    }

    /// Unsubscribes from the given patterns, or from all currently desired
    /// patterns when called with an empty slice.
    pub async fn punsubscribe(&self, patterns: &[Bytes]) -> Result<(), PeridotError> {
        validate_optional_names(patterns)?;
        let (names, send) = {
            let mut subs = self.state.subs.lock();
            if subs.recovery == RecoveryState::Closed {
                return Err(PeridotError::ConnectionClosed);
            }
            let names = if patterns.is_empty() {
                subs.registry.pattern_names()
            } else {
                patterns.to_vec()
            };
            for name in &names {
                subs.registry.remove_pattern(name);
            }
            (names, subs.recovery == RecoveryState::Connected)
        };
        if send {
            self.transport
                .send(PubSubCommand::PUnsubscribe(names))
                .await?;
        }
        Ok(())
    }

    /// Lists the channels with at least one subscriber on the server,
    /// optionally filtered by a glob pattern. Server-global ground truth,
    /// which includes subscribers from other connections.
    pub async fn pubsub_channels(
        &self,
        pattern: Option<Bytes>,
    ) -> Result<Vec<Bytes>, PeridotError> {
        self.ensure_connected()?;
        let reply = self
            .transport
            .request(QueryCommand::Channels(pattern))
            .await?;
        let Reply::Array(items) = reply else {
            return Err(PeridotError::ProtocolViolation(format!(
                "expected array reply for PUBSUB CHANNELS, got {reply:?}"
            )));
        };
        items
            .into_iter()
            .map(|item| {
                item.as_bulk().cloned().ok_or_else(|| {
                    PeridotError::ProtocolViolation(format!(
                        "expected bulk string channel name, got {item:?}"
                    ))
                })
            })
            .collect()
    }

    /// Reports the server-global subscriber count for each given channel,
    /// in the order the server returned them.
    pub async fn pubsub_numsub(
        &self,
        channels: &[Bytes],
    ) -> Result<IndexMap<Bytes, u64>, PeridotError> {
        self.ensure_connected()?;
        let reply = self
            .transport
            .request(QueryCommand::NumSub(channels.to_vec()))
            .await?;
        let Reply::Array(items) = reply else {
            return Err(PeridotError::ProtocolViolation(format!(
                "expected array reply for PUBSUB NUMSUB, got {reply:?}"
            )));
        };
        if items.len() % 2 != 0 {
            return Err(PeridotError::ProtocolViolation(format!(
                "odd-length PUBSUB NUMSUB reply ({} elements)",
                items.len()
            )));
        }
        let mut counts = IndexMap::with_capacity(items.len() / 2);
        for pair in items.chunks_exact(2) {
            let name = pair[0].as_bulk().cloned().ok_or_else(|| {
                PeridotError::ProtocolViolation(format!(
                    "expected bulk string channel name, got {:?}",
                    pair[0]
                ))
            })?;
            let count = pair[1].as_integer().ok_or_else(|| {
                PeridotError::ProtocolViolation(format!(
                    "expected integer subscriber count, got {:?}",
                    pair[1]
                ))
            })?;
            counts.insert(name, count.max(0) as u64);
        }
        Ok(counts)
    }

    /// Reports the server-global number of pattern subscriptions.
    pub async fn pubsub_numpat(&self) -> Result<u64, PeridotError> {
        self.ensure_connected()?;
        let reply = self.transport.request(QueryCommand::NumPat).await?;
        reply
            .as_integer()
            .map(|count| count.max(0) as u64)
            .ok_or_else(|| {
                PeridotError::ProtocolViolation(format!(
                    "expected integer reply for PUBSUB NUMPAT, got {reply:?}"
                ))
            })
    }

    /// Authenticates the connection and records the credentials so the
    /// reconnect coordinator can replay them.
    pub async fn authenticate(
        &self,
        username: Option<&str>,
        password: &str,
    ) -> Result<(), PeridotError> {
        if self.state.recovery() == RecoveryState::Closed {
            return Err(PeridotError::ConnectionClosed);
        }
        let credentials = Credentials {
            username: username.map(str::to_owned),
            password: password.to_owned(),
        };
        self.transport.authenticate(&credentials).await?;
        debug!("Authentication succeeded; credentials recorded for reconnect.");
        *self.state.credentials.lock() = Some(credentials);
        Ok(())
    }

    /// Registers a listener. Safe to call from within a listener callback.
    pub fn add_listener(&self, listener: Arc<dyn PubSubListener>) {
        self.state.listeners.add(listener);
    }

    /// Removes a listener. Once this returns, the listener receives no event
    /// dispatched strictly afterwards; an event already in flight may still
    /// reach it. Safe to call from within a listener callback.
    pub fn remove_listener(&self, listener: &Arc<dyn PubSubListener>) -> bool {
        self.state.listeners.remove(listener)
    }

    /// A receiver of client lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<ClientEvent> {
        self.state.events.subscribe()
    }

    /// The desired channel subscriptions, in insertion order. Remains
    /// inspectable after close.
    pub fn subscribed_channels(&self) -> Vec<Bytes> {
        self.state.subs.lock().registry.channel_names()
    }

    /// The desired pattern subscriptions, in insertion order.
    pub fn subscribed_patterns(&self) -> Vec<Bytes> {
        self.state.subs.lock().registry.pattern_names()
    }

    /// The current recovery state.
    pub fn recovery_state(&self) -> RecoveryState {
        self.state.recovery()
    }

    /// Shuts the client down: stops the dispatcher and coordinator tasks and
    /// releases the connection handles. The registries keep their last state
    /// for inspection, but no further dispatch happens. Idempotent.
    pub fn close(&self) {
        {
            let mut subs = self.state.subs.lock();
            if subs.recovery == RecoveryState::Closed {
                return;
            }
            subs.recovery = RecoveryState::Closed;
        }
        info!("Pub/Sub client closed.");
        self.state.events.publish(ClientEvent::Closed);
        let _ = self.shutdown_tx.send(());
    }

    fn ensure_connected(&self) -> Result<(), PeridotError> {
        match self.state.recovery() {
            RecoveryState::Connected => Ok(()),
            // Introspection needs a live request/reply path; anything short
            // of Connected cannot provide one.
            _ => Err(PeridotError::ConnectionClosed),
        }
    }
}

impl Drop for PubSubClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Rejects an empty name list and empty names, before any bytes are sent.
fn validate_names(names: &[Bytes], operation: &str) -> Result<(), PeridotError> {
    if names.is_empty() {
        return Err(PeridotError::InvalidArgument(format!(
            "wrong number of arguments for '{operation}'"
        )));
    }
    validate_optional_names(names)
}

fn validate_optional_names(names: &[Bytes]) -> Result<(), PeridotError> {
    if names.iter().any(|name| name.is_empty()) {
        return Err(PeridotError::InvalidArgument(
            "channel and pattern names must be non-empty".to_string(),
        ));
    }
    Ok(())
}
