// src/connection/mod.rs

//! Defines the boundary to the connection layer that owns the socket,
//! framing, and reconnect/backoff policy.

// Declare the private sub-modules of the `connection` module.
mod commands;
mod transport;

// Publicly re-export the primary types from the sub-modules.
// This creates a clean public API for the `connection` module, hiding the
// internal file structure from the rest of the crate.
pub use commands::{PubSubCommand, QueryCommand};
pub use transport::{ConnectionEvent, Credentials, Transport};
