// src/lib.rs

pub mod config;
pub mod connection;
pub mod core;

// Re-export
pub use crate::config::PubSubConfig;
pub use crate::connection::{ConnectionEvent, Credentials, PubSubCommand, QueryCommand, Transport};
pub use crate::core::pubsub::{PubSubClient, PubSubListener};
pub use crate::core::{ClientEvent, PeridotError, PushFrame, Reply};
