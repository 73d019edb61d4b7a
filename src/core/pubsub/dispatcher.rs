// src/core/pubsub/dispatcher.rs

//! The single consumption point for decoded push frames. Routes each frame to
//! the listener registry and applies confirmation-driven registry updates.

use crate::core::protocol::PushFrame;
use crate::core::state::ClientState;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Consumes decoded push frames from the connection, strictly in arrival
/// order, and fans each one out to the registered listeners.
///
/// There is exactly one dispatcher per client, so two deliveries never
/// interleave and per-channel message order is preserved end to end.
pub struct Dispatcher {
    state: Arc<ClientState>,
    frames: mpsc::UnboundedReceiver<PushFrame>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl Dispatcher {
    pub fn new(
        state: Arc<ClientState>,
        frames: mpsc::UnboundedReceiver<PushFrame>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            state,
            frames,
            shutdown_rx,
        }
    }

    /// The main consumption loop. Exits when the client is closed or the
    /// frame channel is dropped by the connection layer.
    pub async fn run(mut self) {
        debug!("Dispatcher entering frame consumption loop.");
        loop {
            tokio::select! {
                biased;
                // Prioritize shutdown signals over pending frames.
                _ = self.shutdown_rx.recv() => {
                    debug!("Dispatcher received shutdown signal.");
                    return;
                }
                maybe_frame = self.frames.recv() => {
                    match maybe_frame {
                        Some(frame) => self.handle_frame(frame),
                        None => {
                            debug!("Push frame channel closed by the connection layer.");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Processes a single frame: registry transition first, then listener
    /// fan-out over a snapshot. No lock is held while a callback runs.
    ///
    /// Confirmations are matched by name, not by a request identifier,
    /// because the protocol provides none. Duplicate concurrent subscribes of
    /// the same name therefore produce multiple confirmations, each forwarded
    /// independently; deduplication is an application concern.
    pub fn handle_frame(&self, frame: PushFrame) {
        match frame {
            PushFrame::Message { channel, payload } => {
                for listener in self.state.listeners.snapshot() {
                    listener.on_message(channel.clone(), payload.clone());
                }
            }
            PushFrame::PMessage {
                pattern,
                channel,
                payload,
            } => {
                // The server already decided which pattern matched; it is not
                // re-evaluated here.
                for listener in self.state.listeners.snapshot() {
                    listener.on_pattern_message(pattern.clone(), channel.clone(), payload.clone());
                }
            }
            PushFrame::Subscribed { channel, count } => {
                self.confirm(|subs| subs.registry.confirm_channel(&channel), count);
                for listener in self.state.listeners.snapshot() {
                    listener.on_subscribed(channel.clone(), count);
                }
            }
            PushFrame::PSubscribed { pattern, count } => {
                self.confirm(|subs| subs.registry.confirm_pattern(&pattern), count);
                for listener in self.state.listeners.snapshot() {
                    listener.on_psubscribed(pattern.clone(), count);
                }
            }
            PushFrame::Unsubscribed { channel, count } => {
                self.confirm(|subs| subs.registry.confirm_channel_removed(&channel), count);
                for listener in self.state.listeners.snapshot() {
                    listener.on_unsubscribed(channel.clone(), count);
                }
            }
            PushFrame::PUnsubscribed { pattern, count } => {
                self.confirm(|subs| subs.registry.confirm_pattern_removed(&pattern), count);
                for listener in self.state.listeners.snapshot() {
                    listener.on_punsubscribed(pattern.clone(), count);
                }
            }
            PushFrame::Unrecognized { kind } => {
                // Recovering the interleaved stream is more valuable than
                // failing fast: log and keep consuming.
                warn!(
                    "Dropping unrecognized push frame of kind {:?}.",
                    String::from_utf8_lossy(&kind)
                );
            }
        }
    }

    /// Applies a confirmation-driven registry mutation and cross-checks the
    /// server-reported count against the local total. The server count is
    /// authoritative for listeners either way.
    fn confirm<F>(&self, mutate: F, server_count: u64)
    where
        F: FnOnce(&mut crate::core::state::SubscriptionState),
    {
        let local_count = {
            let mut subs = self.state.subs.lock();
            mutate(&mut subs);
            subs.registry.subscription_count()
        };
        if local_count as u64 != server_count {
            debug!(
                "Local subscription count {} differs from server-reported {}; \
                 interleaved traffic from concurrent calls is the usual cause.",
                local_count, server_count
            );
        }
    }
}
