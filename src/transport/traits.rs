//! Transport Traits
//!
//! The dispatch engine never touches sockets directly. It consumes byte
//! streams through [`Transport`] and discovers new ones through
//! [`Acceptor`], so the same engine serves TCP clients, a local console,
//! or an in-memory pipe in tests.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

/// A bidirectional byte stream owned by one connection.
///
/// Every method must return promptly: the server drives all connections
/// from one loop, so nothing here may wait for the remote side.
pub trait Transport: Send {
    /// Number of bytes that can be read right now without blocking.
    fn available(&mut self) -> usize;

    /// Reads one byte, or `None` if nothing is buffered.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queues bytes for the remote side.
    ///
    /// After [`stop`](Transport::stop) writes are discarded and succeed.
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Pushes queued output towards the remote side as far as possible.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Returns true while the remote side is still reachable.
    ///
    /// Must notice a hang-up without input being read.
    fn connected(&self) -> bool;

    /// Terminates the stream. Idempotent.
    fn stop(&mut self);

    /// Human-readable label of the remote side, for logs.
    fn peer(&self) -> &str;
}

/// A source of newly connected transports.
pub trait Acceptor: Send {
    /// Returns the next pending connection, if any, without blocking.
    fn accept(&mut self) -> Option<Box<dyn Transport>>;

    /// The address being listened on, if this acceptor has one.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// A transport shared between a connection and its background command.
///
/// The lock is only held for the duration of a single transport call.
pub type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

/// Wraps a transport for sharing.
pub fn share(transport: Box<dyn Transport>) -> SharedTransport {
    Arc::new(Mutex::new(transport))
}

/// Locks a shared transport.
///
/// A worker that panicked mid-write leaves the transport usable; the
/// poison flag carries no information the byte stream cares about.
pub fn lock(transport: &SharedTransport) -> MutexGuard<'_, Box<dyn Transport>> {
    transport.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Errors raised while setting up transports.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Any other socket setup failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
