// src/core/errors.rs

//! Defines the primary error type for the client.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the pub/sub client.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
#[derive(Error, Debug)]
pub enum PeridotError {
    /// A malformed channel or pattern name was supplied by the caller.
    /// Raised before any bytes are written to the wire.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was attempted after the client was permanently closed.
    #[error("Connection is closed")]
    ConnectionClosed,

    /// The server rejected the supplied credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// An incoming frame or reply did not match any recognized shape.
    /// The dispatcher logs and drops these; the request path surfaces them.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A transport-level failure reported by the connection collaborator.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
// We wrap it in an Arc to allow for cheap, shared cloning.
impl Clone for PeridotError {
    fn clone(&self) -> Self {
        match self {
            PeridotError::InvalidArgument(s) => PeridotError::InvalidArgument(s.clone()),
            PeridotError::ConnectionClosed => PeridotError::ConnectionClosed,
            PeridotError::AuthenticationFailed(s) => PeridotError::AuthenticationFailed(s.clone()),
            PeridotError::ProtocolViolation(s) => PeridotError::ProtocolViolation(s.clone()),
            PeridotError::Transport(s) => PeridotError::Transport(s.clone()),
            PeridotError::Io(e) => PeridotError::Io(Arc::clone(e)),
        }
    }
}

impl PartialEq for PeridotError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PeridotError::InvalidArgument(s1), PeridotError::InvalidArgument(s2)) => s1 == s2,
            (PeridotError::AuthenticationFailed(s1), PeridotError::AuthenticationFailed(s2)) => {
                s1 == s2
            }
            (PeridotError::ProtocolViolation(s1), PeridotError::ProtocolViolation(s2)) => s1 == s2,
            (PeridotError::Transport(s1), PeridotError::Transport(s2)) => s1 == s2,
            (PeridotError::Io(e1), PeridotError::Io(e2)) => e1.to_string() == e2.to_string(),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl From<std::io::Error> for PeridotError {
    fn from(e: std::io::Error) -> Self {
        PeridotError::Io(Arc::new(e))
    }
}

impl From<String> for PeridotError {
    fn from(s: String) -> Self {
        PeridotError::Transport(s)
    }
}
