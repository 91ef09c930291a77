//! Connection Module
//!
//! This module manages individual client sessions. Unlike a
//! task-per-connection server, every session here is advanced by the
//! server's single update loop, one non-blocking tick at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Server::update()                          │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ for each connection, in accept order
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Connection                               │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐     │
//! │  │ Read bytes  │───>│ Split line  │───>│ Execute cmd │     │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘     │
//! │                                               │             │
//! │                              sync ◄───────────┴──► background
//! │                          (same tick)          (BackgroundTask,
//! │                                                polled later)
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Non-blocking**: reads only what the transport already holds
//! - **Chaining**: `a; b; c` runs left to right, stopping at the first failure
//! - **Background commands**: at most one per connection, polled each tick
//! - **Bounded lines**: a line longer than the limit closes the session

pub mod handler;
pub mod output;
pub mod task;

// Re-export commonly used types
pub use handler::{Connection, ConnectionState, ConnectionStatus};
pub use output::{CommandContext, Output};
pub use task::{BackgroundTask, TaskPoll};
