//! Transport Module
//!
//! Byte-stream plumbing underneath the dispatch engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   accept()   ┌───────────────┐
//! │  Acceptor    │─────────────>│  Transport    │──> Connection
//! │ (TcpAcceptor)│              │ (TcpTransport,│
//! └──────────────┘              │  MemoryTrans.)│
//!                               └───────────────┘
//! ```
//!
//! The engine only sees the [`Transport`] and [`Acceptor`] traits. Two
//! implementations ship with the crate:
//!
//! - **TCP**: non-blocking `std::net` sockets with buffered reads and writes
//! - **Memory**: an in-process pipe for consoles, embedding, and tests

pub mod memory;
pub mod tcp;
pub mod traits;

// Re-export commonly used types
pub use memory::{MemoryPeer, MemoryTransport};
pub use tcp::{TcpAcceptor, TcpTransport};
pub use traits::{Acceptor, SharedTransport, Transport, TransportError};
