// src/connection/transport.rs

//! Defines the `Transport` trait implemented by the connection layer.

use super::commands::{PubSubCommand, QueryCommand};
use crate::core::PeridotError;
use crate::core::protocol::Reply;
use async_trait::async_trait;

/// Credentials recorded by an `AUTH` call and replayed on reconnect.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: String,
}

/// A connection lifecycle event, as reported by the connection layer.
///
/// Retry and backoff between `Disconnected` and `Reconnected` are entirely
/// the connection layer's concern; this crate only reacts to the events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The link was lost, either by network failure or an application-initiated reset.
    Disconnected,
    /// A fresh link is available and ready for commands.
    Reconnected,
}

/// The connection abstraction this crate drives.
///
/// The implementor owns the socket, wire encoding/decoding, and TLS. Decoded
/// push frames and lifecycle events are delivered out-of-band through the
/// channel handles passed to `PubSubClient::new`; this trait carries only the
/// outbound half.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Writes a subscription-affecting command. Fire-and-forget: the
    /// acknowledgement arrives later as a push frame.
    async fn send(&self, command: PubSubCommand) -> Result<(), PeridotError>;

    /// Writes an introspection query and waits for its single reply.
    /// Request/response pairing for these is sequential and unambiguous.
    async fn request(&self, query: QueryCommand) -> Result<Reply, PeridotError>;

    /// Performs the authentication exchange on the current link.
    async fn authenticate(&self, credentials: &Credentials) -> Result<(), PeridotError>;
}
