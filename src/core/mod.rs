// src/core/mod.rs

//! The central module containing the core logic and data structures of the
//! pub/sub client.

pub mod errors;
pub mod events;
pub mod protocol;
pub mod pubsub;
pub mod state;

pub use errors::PeridotError;
pub use events::ClientEvent;
pub use protocol::{PushFrame, Reply};
