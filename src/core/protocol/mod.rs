// src/core/protocol/mod.rs

//! Decoded protocol values exchanged with the connection layer.
//! Wire framing and encoding live in the connection crate, not here.

mod push_frame;
mod reply;

pub use push_frame::PushFrame;
pub use reply::Reply;
