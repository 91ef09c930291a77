//! # lineshell - A Line-Oriented Remote Command Server
//!
//! lineshell gives a network-connected device a small administrative shell:
//! clients connect over TCP (or any byte stream), type commands one line at
//! a time, and get text back on the same stream.
//!
//! ## Features
//!
//! - **Single update loop**: every session is advanced by non-blocking ticks
//! - **Command chaining**: `a; b; c` runs left to right, stopping at the first failure
//! - **Background commands**: long-running handlers opt into a worker thread
//! - **Pluggable transports**: TCP out of the box, or attach any stream
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Server                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │  Acceptor   │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │ (per client)│    │  Registry   │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            │ line             ▼                         │
//! │                            ▼           ┌─────────────┐                  │
//! │                     ┌─────────────┐    │  Handlers   │                  │
//! │                     │  Tokenizer  │    │ help, quit, │                  │
//! │                     └─────────────┘    │ user cmds   │                  │
//! │                                        └──────┬──────┘                  │
//! │                                               │ background?             │
//! │                                               ▼                         │
//! │                     ┌─────────────────────────────────────────────────┐ │
//! │                     │       BackgroundTask (blocking pool / thread)   │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use lineshell::commands::UptimeCommand;
//! use lineshell::server::{Server, ServerConfig};
//! use std::time::Duration;
//!
//! let mut server = Server::bind(&ServerConfig::default())?;
//! server.register_command("uptime", UptimeCommand::new());
//!
//! loop {
//!     server.update();
//!     std::thread::sleep(Duration::from_millis(10));
//! }
//! ```
//!
//! ## Line Protocol
//!
//! - Lines end with `\n`; `\r` is ignored
//! - Commands on one line are separated by `;`
//! - Byte 4 (Ctrl-D) ends the session
//! - A `> ` prompt follows every completed line
//!
//! ## Module Overview
//!
//! - [`protocol`]: tokenizer and line-protocol constants
//! - [`commands`]: handler trait, registry, built-in and stock commands
//! - [`connection`]: per-client state machine and background tasks
//! - [`transport`]: byte-stream traits, TCP and in-memory transports
//! - [`server`]: the server, its configuration and statistics

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod transport;

// Re-export commonly used types for convenience
pub use commands::{CommandError, CommandHandler, CommandRegistry, CommandResult};
pub use connection::{CommandContext, Connection, Output};
pub use protocol::{tokenize, Invocation};
pub use server::{Server, ServerConfig, ServerStats};
pub use transport::{Acceptor, MemoryTransport, TcpAcceptor, Transport};

/// The default port lineshell listens on
pub const DEFAULT_PORT: u16 = 2323;

/// The default host lineshell binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of lineshell
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
