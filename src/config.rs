// src/config.rs

//! Manages client configuration: loading, defaults, and validation.

use crate::connection::Credentials;
use crate::core::events::DEFAULT_EVENT_BUS_CAPACITY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for the pub/sub client.
///
/// All fields have defaults, so an empty TOML document is a valid config.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PubSubConfig {
    /// Username for the initial and reconnect-time authentication exchange.
    /// Only meaningful together with `password`.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for the initial and reconnect-time authentication exchange.
    /// When absent, reconnects skip the re-authentication step.
    #[serde(default)]
    pub password: Option<String>,
    /// Capacity of the lifecycle event broadcast channel.
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

fn default_event_bus_capacity() -> usize {
    DEFAULT_EVENT_BUS_CAPACITY
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl PubSubConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: PubSubConfig = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// The seed credentials, if a password was configured.
    pub fn credentials(&self) -> Option<Credentials> {
        self.password.as_ref().map(|password| Credentials {
            username: self.username.clone(),
            password: password.clone(),
        })
    }
}
