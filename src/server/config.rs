//! Server Configuration

use crate::{DEFAULT_HOST, DEFAULT_PORT};
use std::time::Duration;

/// Default pause between update ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Settings for a network-accepting server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on (0 picks a free port)
    pub port: u16,
    /// Banner written to every new client; empty for none
    pub welcome: String,
    /// Pause between update ticks when driven by the binary
    pub tick_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            welcome: String::new(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
