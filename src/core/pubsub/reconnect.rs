// src/core/pubsub/reconnect.rs

//! Observes connection lifecycle events and restores subscription state on
//! reconnect: re-authenticate first (if credentials were recorded), then
//! replay the registry as fresh subscribe/psubscribe commands.

use crate::connection::{ConnectionEvent, PubSubCommand, Transport};
use crate::core::events::ClientEvent;
use crate::core::pubsub::SubscriptionRegistry;
use crate::core::state::{ClientState, RecoveryState};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Computes the commands needed to restore the registry's replay-eligible
/// entries on a fresh link: at most one `SUBSCRIBE` covering all channels and
/// one `PSUBSCRIBE` covering all patterns, each in registry insertion order.
///
/// Pure function over a registry snapshot, decoupled from the transport, so
/// replay can be exercised without a live connection.
pub fn replay_commands(registry: &SubscriptionRegistry) -> Vec<PubSubCommand> {
    let mut commands = Vec::with_capacity(2);
    let channels = registry.replay_channels();
    if !channels.is_empty() {
        commands.push(PubSubCommand::Subscribe(channels));
    }
    let patterns = registry.replay_patterns();
    if !patterns.is_empty() {
        commands.push(PubSubCommand::PSubscribe(patterns));
    }
    commands
}

/// Drives the recovery state machine:
/// `Connected -> Disconnected -> [Reauthenticating ->] Resubscribing -> Connected`.
///
/// The coordinator performs no backoff of its own; it only reacts to the
/// lifecycle events the connection layer emits.
pub struct ReconnectCoordinator {
    state: Arc<ClientState>,
    transport: Arc<dyn Transport>,
    lifecycle: broadcast::Receiver<ConnectionEvent>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ReconnectCoordinator {
    pub fn new(
        state: Arc<ClientState>,
        transport: Arc<dyn Transport>,
        lifecycle: broadcast::Receiver<ConnectionEvent>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            state,
            transport,
            lifecycle,
            shutdown_rx,
        }
    }

    /// The main lifecycle loop. Exits on shutdown or when the lifecycle
    /// channel is dropped by the connection layer.
    pub async fn run(mut self) {
        debug!("Reconnect coordinator entering lifecycle loop.");
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.recv() => {
                    debug!("Reconnect coordinator received shutdown signal.");
                    return;
                }
                event = self.lifecycle.recv() => {
                    match event {
                        Ok(ConnectionEvent::Disconnected) => self.on_disconnected(),
                        Ok(ConnectionEvent::Reconnected) => self.on_reconnected().await,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            // Missed transitions collapse into "where are we
                            // now"; the next event resynchronizes us.
                            warn!("Lifecycle receiver lagged, missed {n} events.");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Lifecycle channel closed by the connection layer.");
                            return;
                        }
                    }
                }
            }
        }
    }

    fn on_disconnected(&self) {
        {
            let mut subs = self.state.subs.lock();
            if subs.recovery == RecoveryState::Closed {
                return;
            }
            // The registry is deliberately left untouched: it is the replay
            // source once the link comes back.
            subs.recovery = RecoveryState::Disconnected;
        }
        info!("Connection lost; subscription state retained for replay.");
        self.state.events.publish(ClientEvent::Disconnected);
    }

    async fn on_reconnected(&self) {
        if self.state.recovery() == RecoveryState::Closed {
            return;
        }

        if !self.reauthenticate().await {
            return;
        }

        {
            let mut subs = self.state.subs.lock();
            if subs.recovery == RecoveryState::Closed {
                return;
            }
            subs.recovery = RecoveryState::Resubscribing;
        }
        self.state.events.publish(ClientEvent::Resubscribing);
        self.resubscribe().await;
    }

    /// Replays recorded credentials, if any. Returns false when the attempt
    /// is over (failure is fatal for this link; the connection layer's retry
    /// policy will produce another `Reconnected` event).
    async fn reauthenticate(&self) -> bool {
        let credentials = self.state.credentials.lock().clone();
        let Some(credentials) = credentials else {
            return true;
        };

        {
            let mut subs = self.state.subs.lock();
            if subs.recovery == RecoveryState::Closed {
                return false;
            }
            subs.recovery = RecoveryState::Reauthenticating;
        }
        self.state.events.publish(ClientEvent::Reauthenticating);

        match self.transport.authenticate(&credentials).await {
            Ok(()) => {
                debug!("Re-authentication succeeded.");
                true
            }
            Err(e) => {
                warn!("Re-authentication failed on reconnect: {e}");
                {
                    let mut subs = self.state.subs.lock();
                    if subs.recovery != RecoveryState::Closed {
                        subs.recovery = RecoveryState::Disconnected;
                    }
                }
                self.state
                    .events
                    .publish(ClientEvent::AuthenticationFailed(e.to_string()));
                false
            }
        }
    }

    /// Replays the registry, then drains any names the application queued
    /// while the replay was in flight, and finally flips to `Connected`
    /// atomically with the last empty-queue check.
    async fn resubscribe(&self) {
        // First batch: everything replay-eligible at reconnect time.
        let first = {
            let mut subs = self.state.subs.lock();
            if subs.recovery == RecoveryState::Closed {
                return;
            }
            let commands = replay_commands(&subs.registry);
            Self::mark_sent(&mut subs.registry, &commands);
            commands
        };
        let mut replayed = first.iter().map(|c| c.names().len()).sum::<usize>();
        if !self.send_all(first).await {
            return;
        }

        // Drain latecomers the application queued while the replay was in
        // flight. Becoming Connected under the same lock as the final
        // empty-queue check closes the window against a racing queue call.
        loop {
            let commands = {
                let mut subs = self.state.subs.lock();
                if subs.recovery == RecoveryState::Closed {
                    return;
                }
                let mut commands = Vec::with_capacity(2);
                let channels = subs.registry.queued_channels();
                if !channels.is_empty() {
                    commands.push(PubSubCommand::Subscribe(channels));
                }
                let patterns = subs.registry.queued_patterns();
                if !patterns.is_empty() {
                    commands.push(PubSubCommand::PSubscribe(patterns));
                }
                if commands.is_empty() {
                    subs.recovery = RecoveryState::Connected;
                } else {
                    Self::mark_sent(&mut subs.registry, &commands);
                }
                commands
            };

            if commands.is_empty() {
                break;
            }
            replayed += commands.iter().map(|c| c.names().len()).sum::<usize>();
            if !self.send_all(commands).await {
                return;
            }
        }

        info!("Resubscription replay complete ({replayed} names reissued).");
        self.state.events.publish(ClientEvent::Connected);
    }

    fn mark_sent(registry: &mut SubscriptionRegistry, commands: &[PubSubCommand]) {
        for command in commands {
            match command {
                PubSubCommand::Subscribe(names) => {
                    for name in names {
                        registry.note_channel_sent(name);
                    }
                }
                PubSubCommand::PSubscribe(names) => {
                    for name in names {
                        registry.note_pattern_sent(name);
                    }
                }
                _ => {}
            }
        }
    }

    /// Sends a batch of replay commands. On failure the link is considered
    /// dead again; the next Reconnected event restarts recovery from the
    /// retained registry. Returns false when the attempt is over.
    ///
    /// A failed write definitively never left the client, so the names it
    /// covered (and those of any command still pending behind it) owe their
    /// send again: they are reverted to `Queued` under the same lock that
    /// records the failure, keeping them replay-eligible for the next link.
    async fn send_all(&self, commands: Vec<PubSubCommand>) -> bool {
        let mut pending = commands.into_iter();
        while let Some(command) = pending.next() {
            if let Err(e) = self.transport.send(command.clone()).await {
                warn!("Failed to send replay command: {e}");
                let mut subs = self.state.subs.lock();
                if subs.recovery != RecoveryState::Closed {
                    subs.recovery = RecoveryState::Disconnected;
                }
                Self::requeue(&mut subs.registry, &command);
                for unsent in pending {
                    Self::requeue(&mut subs.registry, &unsent);
                }
                return false;
            }
        }
        true
    }

    fn requeue(registry: &mut SubscriptionRegistry, command: &PubSubCommand) {
        match command {
            PubSubCommand::Subscribe(names) => {
                for name in names {
                    registry.requeue_channel(name);
                }
            }
            PubSubCommand::PSubscribe(names) => {
                for name in names {
                    registry.requeue_pattern(name);
                }
            }
            _ => {}
        }
    }
}
