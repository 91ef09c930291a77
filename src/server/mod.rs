//! Server Module
//!
//! The server ties everything together: it owns the command registry and
//! the live connections, accepts new clients, and drives every session
//! from a single cooperative update loop.
//!
//! ## Example
//!
//! ```
//! use lineshell::server::Server;
//! use lineshell::transport::MemoryTransport;
//!
//! let mut server = Server::new("node-7 debug shell");
//!
//! let (transport, peer) = MemoryTransport::pair();
//! server.add_custom_client(Box::new(transport));
//!
//! peer.send_str("help\n");
//! server.update();
//!
//! assert!(peer.output_string().contains("List of commands (2)"));
//! ```

pub mod config;
pub mod engine;
pub mod stats;

// Re-export commonly used types
pub use config::{ServerConfig, DEFAULT_TICK_INTERVAL};
pub use engine::Server;
pub use stats::ServerStats;
