//! In-Memory Transport
//!
//! A pipe between the server and some in-process party: a local console,
//! an embedding application, or a test. [`MemoryTransport::pair`] returns
//! the server end and a [`MemoryPeer`] that plays the remote client.

use crate::transport::traits::Transport;
use bytes::{Buf, Bytes, BytesMut};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Pipe {
    /// Bytes sent by the peer, not yet read by the server
    inbound: BytesMut,
    /// Bytes written by the server, not yet taken by the peer
    outbound: BytesMut,
    /// Cleared by either side hanging up
    closed: bool,
}

fn lock_pipe(pipe: &Mutex<Pipe>) -> MutexGuard<'_, Pipe> {
    pipe.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Server end of an in-memory pipe.
#[derive(Debug)]
pub struct MemoryTransport {
    pipe: Arc<Mutex<Pipe>>,
    label: String,
}

/// Client end of an in-memory pipe.
#[derive(Debug, Clone)]
pub struct MemoryPeer {
    pipe: Arc<Mutex<Pipe>>,
}

impl MemoryTransport {
    /// Creates a connected pair labelled `memory`.
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        Self::pair_named("memory")
    }

    /// Creates a connected pair with a custom log label.
    pub fn pair_named(label: impl Into<String>) -> (MemoryTransport, MemoryPeer) {
        let pipe = Arc::new(Mutex::new(Pipe::default()));

        (
            MemoryTransport {
                pipe: Arc::clone(&pipe),
                label: label.into(),
            },
            MemoryPeer { pipe },
        )
    }
}

impl Transport for MemoryTransport {
    fn available(&mut self) -> usize {
        lock_pipe(&self.pipe).inbound.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut pipe = lock_pipe(&self.pipe);
        pipe.inbound.has_remaining().then(|| pipe.inbound.get_u8())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut pipe = lock_pipe(&self.pipe);
        if !pipe.closed {
            pipe.outbound.extend_from_slice(buf);
        }
        Ok(())
    }

    fn connected(&self) -> bool {
        !lock_pipe(&self.pipe).closed
    }

    fn stop(&mut self) {
        let mut pipe = lock_pipe(&self.pipe);
        pipe.closed = true;
        pipe.inbound.clear();
    }

    fn peer(&self) -> &str {
        &self.label
    }
}

impl MemoryPeer {
    /// Sends raw bytes to the server.
    ///
    /// Ignored once either side has hung up.
    pub fn send(&self, bytes: &[u8]) {
        let mut pipe = lock_pipe(&self.pipe);
        if !pipe.closed {
            pipe.inbound.extend_from_slice(bytes);
        }
    }

    /// Sends text to the server.
    pub fn send_str(&self, text: &str) {
        self.send(text.as_bytes());
    }

    /// Takes everything the server has written so far.
    pub fn take_output(&self) -> Bytes {
        lock_pipe(&self.pipe).outbound.split().freeze()
    }

    /// Takes everything the server has written so far, as text.
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.take_output()).into_owned()
    }

    /// Hangs up. Unread input is discarded; unread output stays takeable.
    pub fn disconnect(&self) {
        let mut pipe = lock_pipe(&self.pipe);
        pipe.closed = true;
        pipe.inbound.clear();
    }

    /// Returns true until either side hangs up.
    pub fn is_open(&self) -> bool {
        !lock_pipe(&self.pipe).closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_to_server() {
        let (mut transport, peer) = MemoryTransport::pair();

        peer.send_str("ab");
        assert_eq!(transport.available(), 2);
        assert_eq!(transport.read_byte(), Some(b'a'));
        assert_eq!(transport.read_byte(), Some(b'b'));
        assert_eq!(transport.read_byte(), None);
        assert_eq!(transport.available(), 0);
    }

    #[test]
    fn test_server_to_peer() {
        let (mut transport, peer) = MemoryTransport::pair();

        transport.write(b"hello ").unwrap();
        transport.write(b"world").unwrap();
        assert_eq!(peer.output_string(), "hello world");
        assert_eq!(peer.output_string(), "");
    }

    #[test]
    fn test_stop_closes_both_ends() {
        let (mut transport, peer) = MemoryTransport::pair();
        peer.send_str("pending");

        transport.stop();
        assert!(!transport.connected());
        assert!(!peer.is_open());
        assert_eq!(transport.available(), 0);

        transport.write(b"dropped").unwrap();
        assert!(peer.take_output().is_empty());
    }

    #[test]
    fn test_peer_disconnect() {
        let (transport, peer) = MemoryTransport::pair_named("console");
        assert_eq!(transport.peer(), "console");

        peer.disconnect();
        assert!(!transport.connected());

        peer.send_str("late");
        assert!(!peer.is_open());
    }
}
