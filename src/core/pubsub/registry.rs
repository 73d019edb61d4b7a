// src/core/pubsub/registry.rs

//! The authoritative mapping of desired channel and pattern subscriptions.
//! Pure state, no I/O.

use bytes::Bytes;
use indexmap::IndexMap;

/// The acknowledgement state of one desired subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckState {
    /// Accepted while disconnected; no command has been written yet.
    /// Gets its first send when the coordinator next drains the registry.
    Queued,
    /// A subscribe command was written but no confirmation has arrived.
    Sent,
    /// The server acknowledged the subscription at least once.
    Confirmed,
}

/// Tracks which exact channels and which glob patterns the application wants
/// to be subscribed to, in insertion order.
///
/// Entries survive connection loss untouched; that is what makes the
/// reconnect replay possible. The replay set consists of `Confirmed` entries
/// (known to have reached the server) and `Queued` entries (accepted while
/// disconnected, still awaiting their first send). `Sent` entries are
/// excluded: a command written just before a disconnect may never have
/// reached the server, and replaying it would claim a confirmation that was
/// never owed.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    channels: IndexMap<Bytes, AckState>,
    patterns: IndexMap<Bytes, AckState>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records a channel as sent on the wire. Idempotent: an entry that was
    /// already confirmed stays confirmed, so a duplicate subscribe call does
    /// not degrade its replay eligibility.
    pub fn note_channel_sent(&mut self, name: &Bytes) {
        let entry = self.channels.entry(name.clone()).or_insert(AckState::Sent);
        if *entry == AckState::Queued {
            *entry = AckState::Sent;
        }
    }

    pub fn note_pattern_sent(&mut self, name: &Bytes) {
        let entry = self.patterns.entry(name.clone()).or_insert(AckState::Sent);
        if *entry == AckState::Queued {
            *entry = AckState::Sent;
        }
    }

    /// Records a channel desired while disconnected. No wire traffic is owed
    /// until the coordinator drains queued entries on reconnect.
    pub fn queue_channel(&mut self, name: &Bytes) {
        self.channels.entry(name.clone()).or_insert(AckState::Queued);
    }

    pub fn queue_pattern(&mut self, name: &Bytes) {
        self.patterns.entry(name.clone()).or_insert(AckState::Queued);
    }

    /// Reverts a channel to `Queued` after its replay write failed before
    /// leaving the client. Only `Sent` entries move; a confirmed entry is
    /// already replay-eligible and keeps its state.
    pub fn requeue_channel(&mut self, name: &Bytes) {
        if let Some(state) = self.channels.get_mut(name) {
            if *state == AckState::Sent {
                *state = AckState::Queued;
            }
        }
    }

    pub fn requeue_pattern(&mut self, name: &Bytes) {
        if let Some(state) = self.patterns.get_mut(name) {
            if *state == AckState::Sent {
                *state = AckState::Queued;
            }
        }
    }

    /// Applies a server confirmation for a channel subscription.
    ///
    /// Upserts: a confirmation for a name the application has meanwhile
    /// removed re-adds it, because the last confirmed operation is
    /// authoritative and the matching unsubscribe confirmation will remove it
    /// again.
    pub fn confirm_channel(&mut self, name: &Bytes) {
        self.channels.insert(name.clone(), AckState::Confirmed);
    }

    pub fn confirm_pattern(&mut self, name: &Bytes) {
        self.patterns.insert(name.clone(), AckState::Confirmed);
    }

    /// Applies a server confirmation for a channel unsubscription.
    pub fn confirm_channel_removed(&mut self, name: &Bytes) {
        self.channels.shift_remove(name);
    }

    pub fn confirm_pattern_removed(&mut self, name: &Bytes) {
        self.patterns.shift_remove(name);
    }

    /// Removes a channel from the desired set (optimistic unsubscribe).
    pub fn remove_channel(&mut self, name: &Bytes) {
        self.channels.shift_remove(name);
    }

    pub fn remove_pattern(&mut self, name: &Bytes) {
        self.patterns.shift_remove(name);
    }

    pub fn contains_channel(&self, name: &Bytes) -> bool {
        self.channels.contains_key(name)
    }

    pub fn contains_pattern(&self, name: &Bytes) -> bool {
        self.patterns.contains_key(name)
    }

    /// The desired channel names, in insertion order.
    pub fn channel_names(&self) -> Vec<Bytes> {
        self.channels.keys().cloned().collect()
    }

    /// The desired pattern names, in insertion order.
    pub fn pattern_names(&self) -> Vec<Bytes> {
        self.patterns.keys().cloned().collect()
    }

    /// The channels eligible for reconnect replay, in insertion order.
    pub fn replay_channels(&self) -> Vec<Bytes> {
        self.channels
            .iter()
            .filter(|(_, state)| **state != AckState::Sent)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The patterns eligible for reconnect replay, in insertion order.
    pub fn replay_patterns(&self) -> Vec<Bytes> {
        self.patterns
            .iter()
            .filter(|(_, state)| **state != AckState::Sent)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The channels still awaiting their first send, in insertion order.
    pub fn queued_channels(&self) -> Vec<Bytes> {
        self.channels
            .iter()
            .filter(|(_, state)| **state == AckState::Queued)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The patterns still awaiting their first send, in insertion order.
    pub fn queued_patterns(&self) -> Vec<Bytes> {
        self.patterns
            .iter()
            .filter(|(_, state)| **state == AckState::Queued)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// True if any entry is still awaiting its first send.
    pub fn has_queued(&self) -> bool {
        self.channels.values().any(|s| *s == AckState::Queued)
            || self.patterns.values().any(|s| *s == AckState::Queued)
    }

    /// The local total of desired channel and pattern subscriptions.
    ///
    /// Only a sanity cross-check against the counts the server reports in
    /// confirmation frames; never forwarded to listeners.
    pub fn subscription_count(&self) -> usize {
        self.channels.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.patterns.is_empty()
    }
}
