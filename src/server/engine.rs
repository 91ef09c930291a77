//! Command Server
//!
//! The server owns the command registry and every live connection, and
//! advances all of them from one cooperative loop.
//!
//! ## One Tick
//!
//! ```text
//! update()
//!   │
//!   ├─ accept every pending client (network variant only)
//!   │     └─ wrap each in a Connection (greeting sent immediately)
//!   │
//!   └─ for each connection, in accept order:
//!         update it; drop it if it ended or is no longer connected
//! ```
//!
//! Dead connections are removed in the same pass that updates them, with
//! `Vec::retain_mut`: every survivor is updated exactly once per tick and
//! a removal never causes the next connection to be skipped.

use crate::commands::{CommandHandler, CommandRegistry, HelpCommand, Parameter, QuitCommand};
use crate::connection::Connection;
use crate::server::config::ServerConfig;
use crate::server::stats::ServerStats;
use crate::transport::{Acceptor, TcpAcceptor, Transport, TransportError};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// A line-oriented command server.
pub struct Server {
    /// Registered commands; cloned on write while a background command holds a snapshot
    registry: Arc<CommandRegistry>,

    /// Live connections, in acceptance order
    connections: Vec<Connection>,

    /// Source of new clients; `None` for an embedded server
    acceptor: Option<Box<dyn Acceptor>>,

    /// Banner written to every new client
    welcome: String,

    /// Statistics (shared with connections)
    stats: Arc<ServerStats>,
}

impl Server {
    /// Creates a server without a listening socket.
    ///
    /// Clients are attached with [`Server::add_custom_client`].
    pub fn new(welcome: impl Into<String>) -> Self {
        let mut server = Self {
            registry: Arc::new(CommandRegistry::new()),
            connections: Vec::new(),
            acceptor: None,
            welcome: welcome.into(),
            stats: Arc::new(ServerStats::new()),
        };

        server.register_command("help", HelpCommand);
        server.register_command("quit", QuitCommand);
        server
    }

    /// Creates a server that accepts clients from `acceptor`.
    pub fn with_acceptor(welcome: impl Into<String>, acceptor: Box<dyn Acceptor>) -> Self {
        let mut server = Self::new(welcome);
        server.acceptor = Some(acceptor);
        server
    }

    /// Creates a server listening on the configured TCP address.
    pub fn bind(config: &ServerConfig) -> Result<Self, TransportError> {
        let acceptor = TcpAcceptor::bind(config.bind_address())?;
        if let Some(addr) = acceptor.local_addr() {
            info!(addr = %addr, "Listening");
        }

        Ok(Self::with_acceptor(config.welcome.clone(), Box::new(acceptor)))
    }

    /// Runs one tick: accepts new clients, then updates every connection.
    ///
    /// Returns true if any connection is still active.
    pub fn update(&mut self) -> bool {
        self.accept_new_clients();
        self.update_clients();

        !self.connections.is_empty()
    }

    fn accept_new_clients(&mut self) {
        let Some(acceptor) = self.acceptor.as_mut() else {
            return;
        };

        let mut accepted = Vec::new();
        while let Some(transport) = acceptor.accept() {
            accepted.push(transport);
        }

        for transport in accepted {
            self.add_custom_client(transport);
        }
    }

    fn update_clients(&mut self) {
        let registry = &self.registry;

        self.connections.retain_mut(|connection| {
            let alive = connection.update(registry).is_alive() && connection.connected();
            if !alive {
                info!(client = %connection.peer(), "Client disconnected");
            }
            alive
        });
    }

    /// Registers a command, replacing any earlier command of the same name.
    pub fn register_command<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.register_command_with_parameters(name, Vec::new(), handler);
    }

    /// Registers a command along with its parameter descriptors.
    pub fn register_command_with_parameters<H>(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        handler: H,
    ) where
        H: CommandHandler + 'static,
    {
        let name = name.into();
        debug!(command = %name, "Registering command");
        Arc::make_mut(&mut self.registry).register_with_parameters(name, parameters, handler);
    }

    /// Looks up a command handler by exact name.
    pub fn command_handler(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.registry.lookup(name)
    }

    /// All registered commands.
    pub fn commands(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The banner written to new clients.
    pub fn welcome_line(&self) -> &str {
        &self.welcome
    }

    /// Attaches an externally supplied stream as a new client.
    ///
    /// The client is greeted right away and served until it disconnects.
    pub fn add_custom_client(&mut self, transport: Box<dyn Transport>) {
        let connection = Connection::new(transport, &self.welcome, Arc::clone(&self.stats));
        self.connections.push(connection);
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The listening address, for the network variant.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.acceptor.as_ref().and_then(|acceptor| acceptor.local_addr())
    }

    /// Shared statistics.
    pub fn stats(&self) -> &Arc<ServerStats> {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandError, CommandResult, EchoCommand, SleepCommand};
    use crate::connection::Output;
    use crate::protocol::PROMPT;
    use crate::transport::{MemoryPeer, MemoryTransport};
    use std::fmt::Write;
    use std::io::{Read, Write as _};
    use std::net::{Shutdown, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    fn attach(server: &mut Server) -> MemoryPeer {
        let (transport, peer) = MemoryTransport::pair();
        server.add_custom_client(Box::new(transport));
        let _ = peer.output_string();
        peer
    }

    #[test]
    fn test_builtins_registered() {
        let server = Server::new("");

        assert_eq!(server.commands().len(), 2);
        assert!(server.command_handler("help").is_some());
        assert!(server.command_handler("quit").is_some());
        assert!(server.command_handler("missing").is_none());
    }

    #[test]
    fn test_update_without_clients() {
        let mut server = Server::new("");
        assert!(!server.update());
        assert_eq!(server.connection_count(), 0);
        assert!(server.local_addr().is_none());
    }

    #[test]
    fn test_welcome_banner() {
        let mut server = Server::new("Welcome to node-7");
        assert_eq!(server.welcome_line(), "Welcome to node-7");

        let (transport, peer) = MemoryTransport::pair();
        server.add_custom_client(Box::new(transport));

        let greeting = peer.output_string();
        assert!(greeting.starts_with("Welcome to node-7\n"));
        assert!(greeting.contains("type 'help' for a list of commands"));
        assert!(greeting.ends_with(PROMPT));
    }

    #[test]
    fn test_help_lists_builtins() {
        let mut server = Server::new("");
        let peer = attach(&mut server);

        peer.send_str("help\n");
        assert!(server.update());

        let output = peer.output_string();
        assert!(output.contains("List of commands (2)"));
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines.contains(&"help"));
        assert!(lines.contains(&"quit"));
        assert!(output.ends_with(PROMPT));
    }

    #[test]
    fn test_help_lists_each_name_once() {
        let mut server = Server::new("");
        server.register_command("echo", EchoCommand);
        server.register_command("echo", EchoCommand);
        server.register_command("zeta", EchoCommand);
        let peer = attach(&mut server);

        peer.send_str("help\n");
        server.update();

        let output = peer.output_string();
        assert!(output.contains("List of commands (4)"));
        for name in ["echo", "help", "quit", "zeta"] {
            assert_eq!(output.lines().filter(|line| *line == name).count(), 1);
        }
    }

    #[test]
    fn test_last_registration_wins() {
        let mut server = Server::new("");
        server.register_command("greet", |out: &mut Output, _: &[String]| -> CommandResult {
            writeln!(out, "first").map_err(|_| CommandError::Failed)
        });
        server.register_command("greet", |out: &mut Output, _: &[String]| -> CommandResult {
            writeln!(out, "second").map_err(|_| CommandError::Failed)
        });
        let peer = attach(&mut server);

        peer.send_str("greet\n");
        server.update();
        assert_eq!(peer.output_string(), "second\n> ");
    }

    #[test]
    fn test_unknown_command_keeps_connection() {
        let mut server = Server::new("");
        let peer = attach(&mut server);

        peer.send_str("bogus\n");
        assert!(server.update());

        let output = peer.output_string();
        assert!(output.contains("Command 'bogus' not found"));
        assert!(output.ends_with(PROMPT));
        assert_eq!(server.connection_count(), 1);
        assert_eq!(server.stats().unknown_commands.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_quit_removes_connection() {
        let mut server = Server::new("");
        let peer = attach(&mut server);

        peer.send_str("quit\n");
        assert!(!server.update());
        assert!(!peer.is_open());
        assert_eq!(server.stats().active_connections.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_eof_byte_removes_connection() {
        let mut server = Server::new("");
        let peer = attach(&mut server);

        peer.send(&[b'h', 4]);
        assert!(!server.update());
        assert!(peer.output_string().contains("Goodbye"));
    }

    #[test]
    fn test_pruning_does_not_skip_neighbours() {
        let mut server = Server::new("");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        server.register_command("count", move |_: &mut Output, _: &[String]| -> CommandResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let peers: Vec<MemoryPeer> = (0..5).map(|_| attach(&mut server)).collect();

        // Adjacent dead connections followed by live ones.
        peers[0].disconnect();
        peers[1].send_str("quit\n");
        peers[2].send_str("count\n");
        peers[3].disconnect();
        peers[4].send_str("count\n");

        assert!(server.update());
        assert_eq!(server.connection_count(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(peers[2].output_string(), PROMPT);
        assert_eq!(peers[4].output_string(), PROMPT);
    }

    #[test]
    fn test_connections_updated_in_accept_order() {
        let mut server = Server::new("");
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&order);
        server.register_command("mark", move |_: &mut Output, args: &[String]| -> CommandResult {
            seen.lock().unwrap().push(args.join(""));
            Ok(())
        });

        let peers: Vec<MemoryPeer> = (0..3).map(|_| attach(&mut server)).collect();
        for (i, peer) in peers.iter().enumerate().rev() {
            peer.send_str(&format!("mark {}\n", i));
        }

        server.update();
        assert_eq!(*order.lock().unwrap(), vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_background_command_through_server() {
        let mut server = Server::new("");
        server.register_command_with_parameters("sleep", SleepCommand::parameters(), SleepCommand);
        let peer = attach(&mut server);
        let other = attach(&mut server);

        peer.send_str("sleep 50\n");
        assert!(server.update());
        assert_eq!(peer.output_string(), "");

        // Other clients keep being served meanwhile.
        other.send_str("help\n");
        server.update();
        assert!(other.output_string().contains("List of commands (3)"));

        let mut seen = String::new();
        for _ in 0..200 {
            server.update();
            seen.push_str(&peer.output_string());
            if seen.ends_with(PROMPT) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(seen, "Slept 50 ms\n> ");
    }

    #[test]
    fn test_registry_snapshot_survives_registration() {
        let mut server = Server::new("");
        let snapshot = Arc::clone(&server.registry);

        server.register_command("echo", EchoCommand);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(server.commands().len(), 3);
    }

    /// Reads from `client` while ticking `server` until `expected` shows up.
    fn read_until(server: &mut Server, client: &mut TcpStream, expected: &str) -> String {
        client
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(3);
        let mut received = String::new();
        let mut buf = [0u8; 1024];

        while !received.contains(expected) {
            assert!(Instant::now() < deadline, "timed out; got {:?}", received);
            server.update();
            if let Ok(n) = client.read(&mut buf) {
                received.push_str(&String::from_utf8_lossy(&buf[..n]));
            }
        }
        received
    }

    /// Ticks `server` until `done` holds or three seconds pass.
    fn tick_until(server: &mut Server, mut done: impl FnMut(&Server) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(3);
        while !done(&*server) {
            assert!(Instant::now() < deadline, "timed out");
            server.update();
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn bind_local() -> Server {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        Server::bind(&config).unwrap()
    }

    #[test]
    fn test_tcp_half_closed_client_gets_reply() {
        let mut server = bind_local();
        let addr = server.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"help\n").unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        tick_until(&mut server, |s| {
            s.stats().connections_accepted.load(Ordering::Relaxed) == 1 && s.connection_count() == 0
        });

        client
            .set_read_timeout(Some(Duration::from_secs(3)))
            .unwrap();
        let mut received = String::new();
        client.read_to_string(&mut received).unwrap();
        assert!(received.contains("List of commands (2)"), "got {:?}", received);
        assert!(received.ends_with(PROMPT));
    }

    #[test]
    fn test_tcp_hang_up_during_background_command() {
        let mut server = bind_local();
        server.register_command_with_parameters("sleep", SleepCommand::parameters(), SleepCommand);
        let addr = server.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        read_until(&mut server, &mut client, PROMPT);

        client.write_all(b"sleep 5000\n").unwrap();
        tick_until(&mut server, |s| {
            s.stats().commands_dispatched.load(Ordering::Relaxed) == 1
        });
        assert_eq!(server.connection_count(), 1);

        let started = Instant::now();
        drop(client);
        tick_until(&mut server, |s| s.connection_count() == 0);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(server.stats().active_connections.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_tcp_session() {
        let config = ServerConfig {
            port: 0,
            welcome: "lineshell test".to_string(),
            ..Default::default()
        };
        let mut server = Server::bind(&config).unwrap();
        let addr = server.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        let greeting = read_until(&mut server, &mut client, PROMPT);
        assert!(greeting.starts_with("lineshell test\n"));
        assert_eq!(server.connection_count(), 1);

        client.write_all(b"help\r\n").unwrap();
        let output = read_until(&mut server, &mut client, "quit\n> ");
        assert!(output.contains("List of commands (2)"));

        client.write_all(b"quit\n").unwrap();
        let deadline = Instant::now() + Duration::from_secs(3);
        while server.connection_count() > 0 {
            assert!(Instant::now() < deadline, "connection not removed");
            server.update();
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}
