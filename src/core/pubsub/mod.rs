// src/core/pubsub/mod.rs

//! The subscription-and-dispatch core: registries, dispatcher, reconnect
//! coordinator, and the public client façade.

pub mod client;
pub mod dispatcher;
pub mod listener;
pub mod reconnect;
pub mod registry;

pub use client::PubSubClient;
pub use dispatcher::Dispatcher;
pub use listener::{ListenerRegistry, PubSubListener};
pub use reconnect::{ReconnectCoordinator, replay_commands};
pub use registry::{AckState, SubscriptionRegistry};
