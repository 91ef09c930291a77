//! TCP Transport
//!
//! Non-blocking `std::net` sockets adapted to the [`Transport`] and
//! [`Acceptor`] traits.
//!
//! ## Buffer Management
//!
//! Reads and writes never wait. Incoming data is pulled into a `BytesMut`
//! whenever [`Transport::available`] is called, and outgoing data is queued
//! in a second `BytesMut` that drains as far as the socket accepts. A
//! `WouldBlock` leaves the remainder queued for the next call.
//!
//! ```text
//!   socket ──read()──> inbound ──read_byte()──> Connection
//!   socket <─write()── outbound <──write()───── Connection / handlers
//! ```
//!
//! ## Half-Close
//!
//! A peer that shuts down its sending side still gets every reply: EOF on
//! the read side only marks the input as finished. The transport reports
//! itself disconnected once the buffered input has been consumed, or as
//! soon as a read or write fails outright.

use crate::transport::traits::{Acceptor, Transport, TransportError};
use bytes::{Buf, BytesMut};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, trace, warn};

/// Size of one socket read
const READ_CHUNK_SIZE: usize = 1024;

/// Inbound data beyond this is left in the kernel until the line buffer catches up (64 KB)
const MAX_INBOUND_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// A connected TCP client.
pub struct TcpTransport {
    /// The socket, in non-blocking mode
    stream: TcpStream,

    /// Peer address as text (for logging)
    peer: String,

    /// Bytes read from the socket but not yet consumed
    inbound: BytesMut,

    /// Bytes written by the server but not yet accepted by the socket
    outbound: BytesMut,

    /// The peer will send nothing more
    read_closed: bool,

    /// Cleared on hard I/O errors or `stop()`
    link_alive: bool,
}

impl TcpTransport {
    /// Wraps an accepted or connected socket, switching it to non-blocking mode.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?.to_string();

        Ok(Self {
            stream,
            peer,
            inbound: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            outbound: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            read_closed: false,
            link_alive: true,
        })
    }

    /// Pulls whatever the socket has ready into the inbound buffer.
    fn fill(&mut self) {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while self.link_alive && !self.read_closed && self.inbound.len() < MAX_INBOUND_SIZE {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    debug!(client = %self.peer, "Peer finished sending");
                    self.read_closed = true;
                }
                Ok(n) => {
                    trace!(client = %self.peer, bytes = n, "Read data");
                    self.inbound.extend_from_slice(&chunk[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(client = %self.peer, error = %e, "Read failed");
                    self.disconnect();
                }
            }
        }
    }

    /// Checks for a hang-up without consuming input.
    fn peer_sending(&self) -> bool {
        let mut probe = [0u8; 1];
        match self.stream.peek(&mut probe) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => matches!(
                e.kind(),
                io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
            ),
        }
    }

    /// Writes queued output until the socket stops accepting it.
    fn drain_outbound(&mut self) -> io::Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => {
                    self.disconnect();
                    return Err(io::ErrorKind::WriteZero.into());
                }
                Ok(n) => {
                    trace!(client = %self.peer, bytes = n, "Sent data");
                    self.outbound.advance(n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(client = %self.peer, error = %e, "Write failed");
                    self.disconnect();
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    fn disconnect(&mut self) {
        self.link_alive = false;
        self.discard_outbound("link lost");
    }

    fn discard_outbound(&mut self, reason: &str) {
        if !self.outbound.is_empty() {
            debug!(
                client = %self.peer,
                bytes = self.outbound.len(),
                reason,
                "Discarding unsent output"
            );
            self.outbound.clear();
        }
    }
}

impl Transport for TcpTransport {
    fn available(&mut self) -> usize {
        // Output is pushed here too so a quiet client still receives it.
        let _ = self.drain_outbound();
        self.fill();
        self.inbound.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inbound.has_remaining().then(|| self.inbound.get_u8())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        if !self.link_alive {
            return Ok(());
        }

        self.outbound.extend_from_slice(buf);
        self.drain_outbound()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_outbound()
    }

    fn connected(&self) -> bool {
        if !self.link_alive {
            return false;
        }
        if !self.inbound.is_empty() {
            return true;
        }
        !self.read_closed && self.peer_sending()
    }

    fn stop(&mut self) {
        if !self.link_alive {
            return;
        }

        let _ = self.drain_outbound();
        self.discard_outbound("stopped");
        let _ = self.stream.shutdown(Shutdown::Both);
        self.link_alive = false;
        self.inbound.clear();
        debug!(client = %self.peer, "Transport stopped");
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

/// A non-blocking TCP listening socket.
pub struct TcpAcceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpAcceptor {
    /// Binds a listening socket and switches it to non-blocking mode.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address to bind; port 0 picks a free port
    pub fn bind(addr: impl ToSocketAddrs + ToString) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(&addr).map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
        })
    }
}

impl Acceptor for TcpAcceptor {
    fn accept(&mut self) -> Option<Box<dyn Transport>> {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => match TcpTransport::new(stream) {
                    Ok(transport) => return Some(Box::new(transport)),
                    Err(e) => {
                        warn!(client = %addr, error = %e, "Failed to set up accepted socket");
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return None,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    return None;
                }
            }
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        Some(self.local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    /// Polls `f` until it yields a value or two seconds pass.
    fn wait_for<T>(mut f: impl FnMut() -> Option<T>) -> T {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            if let Some(value) = f() {
                return value;
            }
            assert!(Instant::now() < deadline, "timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_accept_nothing_pending() {
        let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").unwrap();
        assert!(acceptor.accept().is_none());
        assert_ne!(acceptor.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_read_and_write() {
        let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").unwrap();
        let addr = acceptor.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        let mut transport = wait_for(|| acceptor.accept());

        client.write_all(b"hi\n").unwrap();
        wait_for(|| (transport.available() >= 3).then_some(()));
        assert_eq!(transport.read_byte(), Some(b'h'));
        assert_eq!(transport.read_byte(), Some(b'i'));
        assert_eq!(transport.read_byte(), Some(b'\n'));
        assert_eq!(transport.read_byte(), None);

        transport.write(b"> ").unwrap();
        let mut buf = [0u8; 2];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"> ");
    }

    #[test]
    fn test_peer_close_detected() {
        let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").unwrap();
        let addr = acceptor.local_addr().unwrap();

        let client = TcpStream::connect(addr).unwrap();
        let mut transport = wait_for(|| acceptor.accept());
        assert!(transport.connected());

        drop(client);
        wait_for(|| {
            transport.available();
            (!transport.connected()).then_some(())
        });
    }

    #[test]
    fn test_half_closed_peer_still_receives_output() {
        let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").unwrap();
        let addr = acceptor.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        let mut transport = wait_for(|| acceptor.accept());

        client.write_all(b"hi\n").unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        wait_for(|| (transport.available() >= 3).then_some(()));
        assert!(transport.connected());
        while transport.read_byte().is_some() {}

        // Input is used up and the peer is done sending.
        wait_for(|| {
            transport.available();
            (!transport.connected()).then_some(())
        });

        transport.write(b"bye\n").unwrap();
        drop(transport);

        let mut reply = String::new();
        client.read_to_string(&mut reply).unwrap();
        assert_eq!(reply, "bye\n");
    }

    #[test]
    fn test_hang_up_seen_without_reading() {
        let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").unwrap();
        let addr = acceptor.local_addr().unwrap();

        let client = TcpStream::connect(addr).unwrap();
        let transport = wait_for(|| acceptor.accept());
        assert!(transport.connected());

        drop(client);
        wait_for(|| (!transport.connected()).then_some(()));
    }

    #[test]
    fn test_stop_discards_writes() {
        let mut acceptor = TcpAcceptor::bind("127.0.0.1:0").unwrap();
        let addr = acceptor.local_addr().unwrap();

        let _client = TcpStream::connect(addr).unwrap();
        let mut transport = wait_for(|| acceptor.accept());

        transport.stop();
        assert!(!transport.connected());
        assert!(transport.write(b"ignored").is_ok());
        assert_eq!(transport.available(), 0);
    }

    #[test]
    fn test_bind_error() {
        let first = TcpAcceptor::bind("127.0.0.1:0").unwrap();
        let addr = first.local_addr().unwrap();

        let err = TcpAcceptor::bind(addr).err().unwrap();
        assert!(matches!(err, TransportError::Bind { .. }));
    }
}
