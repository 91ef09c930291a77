//! Server Statistics
//!
//! Lock-free counters shared by the server and all of its connections.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for the server and its connections
#[derive(Debug, Default)]
pub struct ServerStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total lines completed by clients
    pub lines_processed: AtomicU64,
    /// Total commands handed to a handler
    pub commands_dispatched: AtomicU64,
    /// Total lookups of names that were not registered
    pub unknown_commands: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn line_processed(&self) {
        self.lines_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_dispatched(&self) {
        self.commands_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unknown_command(&self) {
        self.unknown_commands.fetch_add(1, Ordering::Relaxed);
    }
}
