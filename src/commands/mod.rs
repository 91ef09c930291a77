//! Command Module
//!
//! This module implements the command layer: the handler contract, the
//! name-to-handler registry, and the commands that ship with the crate.
//!
//! ## Architecture
//!
//! ```text
//! Client line
//!       │
//!       ▼
//! ┌─────────────────┐
//! │   Tokenizer     │  (protocol module)
//! └────────┬────────┘
//!          │ name + args
//!          ▼
//! ┌─────────────────┐
//! │ CommandRegistry │  (this module)
//! │                 │
//! │  - Register     │
//! │  - Lookup       │
//! │  - List         │
//! └────────┬────────┘
//!          │ Arc<dyn CommandHandler>
//!          ▼
//! ┌─────────────────┐
//! │ CommandHandler  │──> Output (back to the client)
//! └─────────────────┘
//! ```
//!
//! ## Shipped Commands
//!
//! ### Built-in (always registered)
//! - `help` - list registered commands
//! - `quit` - close the connection
//!
//! ### Stock (opt-in)
//! - `uptime` - time since start
//! - `echo [args...]` - print arguments
//! - `sleep <ms>` - background wait

pub mod builtin;
pub mod handler;
pub mod registry;
pub mod stock;

// Re-export the main command types
pub use builtin::{HelpCommand, QuitCommand};
pub use handler::{CommandError, CommandHandler, CommandResult};
pub use registry::{CommandEntry, CommandRegistry, DataType, Parameter};
pub use stock::{EchoCommand, SleepCommand, UptimeCommand};
