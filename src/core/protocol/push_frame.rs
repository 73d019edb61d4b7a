// src/core/protocol/push_frame.rs

//! Defines the decoded server-pushed event frames consumed by the dispatcher.

use bytes::Bytes;

/// A server-originated, unsolicited event delivered over the same connection
/// as commands, already decoded and tagged by the connection layer.
///
/// Confirmations (`Subscribed`, `Unsubscribed`, `PSubscribed`, `PUnsubscribed`)
/// carry the post-operation total subscription count as reported by the
/// server. That count is forwarded to listeners verbatim; the local registry
/// is never the source of truth for it.
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    /// A message published to an exactly-subscribed channel.
    Message { channel: Bytes, payload: Bytes },
    /// A message published to a channel matched by a subscribed pattern.
    /// The server reports which pattern matched; the client never re-matches.
    PMessage {
        pattern: Bytes,
        channel: Bytes,
        payload: Bytes,
    },
    /// Acknowledgement of a channel subscription.
    Subscribed { channel: Bytes, count: u64 },
    /// Acknowledgement of a channel unsubscription. A count of zero after an
    /// unsubscribe-all is a valid terminal state.
    Unsubscribed { channel: Bytes, count: u64 },
    /// Acknowledgement of a pattern subscription.
    PSubscribed { pattern: Bytes, count: u64 },
    /// Acknowledgement of a pattern unsubscription.
    PUnsubscribed { pattern: Bytes, count: u64 },
    /// A decoded push frame the connection layer could not classify.
    /// The dispatcher logs and drops these rather than failing the stream.
    Unrecognized { kind: Bytes },
}
