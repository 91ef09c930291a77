//! Handler-Facing Session Types
//!
//! [`Output`] is where a handler writes its response; [`CommandContext`]
//! gives a handler access to the session that invoked it. Both hold a
//! clone of the connection's shared transport, so a background command
//! can keep writing after the update loop has moved on.

use crate::commands::CommandRegistry;
use crate::transport::traits::{self, SharedTransport, Transport};
use std::fmt;
use std::io;
use std::sync::Arc;

/// Text sink connected to one client.
///
/// Implements [`fmt::Write`], so handlers use `write!` and `writeln!`.
#[derive(Clone)]
pub struct Output {
    transport: SharedTransport,
}

impl Output {
    pub fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    /// Wraps a standalone transport, e.g. to run a handler outside a server.
    pub fn from_transport(transport: Box<dyn Transport>) -> Self {
        Self::new(traits::share(transport))
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        traits::lock(&self.transport).write(bytes)
    }

    /// Returns true while the client is reachable.
    pub fn is_connected(&self) -> bool {
        traits::lock(&self.transport).connected()
    }
}

impl fmt::Write for Output {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("peer", &traits::lock(&self.transport).peer())
            .finish()
    }
}

/// What a handler can see of the session that invoked it.
#[derive(Clone)]
pub struct CommandContext {
    transport: SharedTransport,
    registry: Arc<CommandRegistry>,
}

impl CommandContext {
    pub fn new(transport: SharedTransport, registry: Arc<CommandRegistry>) -> Self {
        Self {
            transport,
            registry,
        }
    }

    /// The commands registered when this invocation started.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Closes the invoking connection.
    ///
    /// The server drops the connection on its next liveness check.
    pub fn close(&self) {
        traits::lock(&self.transport).stop();
    }

    /// Returns true while the invoking connection is open.
    pub fn is_connected(&self) -> bool {
        traits::lock(&self.transport).connected()
    }

    /// Label of the remote side.
    pub fn peer(&self) -> String {
        traits::lock(&self.transport).peer().to_owned()
    }
}
