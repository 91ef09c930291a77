//! Connection State Machine
//!
//! This module drives one client session: it reads bytes from the
//! transport, assembles them into lines, splits lines into commands and
//! dispatches each command through the registry.
//!
//! ## States
//!
//! ```text
//!                  line done, sync command(s)
//!                 ┌──────────────────────────┐
//!                 ▼                          │
//!          ┌───────────────┐  background  ┌──┴─────────────┐
//! new() ──>│ AwaitingInput │─────────────>│ CommandRunning │
//!          └───────┬───────┘   command    └──────┬─────────┘
//!                  │          <───────────────────┘
//!                  │            task completed (prompt)
//!                  │
//!                  │ EOF byte / overflow / quit / disconnect
//!                  ▼
//!          ┌───────────────┐
//!          │    Closed     │
//!          └───────────────┘
//! ```
//!
//! ## One Update Tick
//!
//! 1. If a background command is outstanding, poll it. Still running:
//!    return right away without touching input, unless the client hung up.
//!    Finished: print the prompt.
//! 2. Drain every byte the transport has ready. `\n` completes a line,
//!    `\r` is dropped, byte 4 ends the session, anything else is buffered.
//! 3. A completed line is split on `;` and run left to right, stopping at
//!    the first failure or at the first background command.
//!
//! While a background command runs, no input is read: bytes stay queued in
//! the transport and are processed in order once the command finishes.
//! The worker and the update loop therefore never write concurrently.

use crate::commands::{CommandError, CommandRegistry, CommandResult};
use crate::connection::output::{CommandContext, Output};
use crate::connection::task::{BackgroundTask, TaskPoll};
use crate::protocol::types::{
    BANNER_RULE, CARRIAGE_RETURN, EOF_BYTE, GOODBYE_MESSAGE, LINE_SIZE_LIMIT, NEWLINE,
    OVERFLOW_MESSAGE, PROMPT, USAGE_HINT,
};
use crate::protocol::{not_found_message, split_commands, Invocation};
use crate::server::ServerStats;
use crate::transport::traits::{self, SharedTransport, Transport};
use bytes::{BufMut, BytesMut};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Reading input
    AwaitingInput,
    /// A background command is outstanding; input is not being read
    CommandRunning,
    /// Terminal
    Closed,
}

/// What an update tick concluded about the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Keep calling `update()`
    Alive,
    /// The session is over; drop the connection
    Ended,
}

impl ConnectionStatus {
    pub fn is_alive(self) -> bool {
        self == ConnectionStatus::Alive
    }
}

/// How one line (or one segment of it) went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    /// Ran to completion successfully
    Done,
    /// Handed off to a background task
    Backgrounded,
    /// Malformed, unknown, or the handler failed
    Failed,
}

/// One client session.
pub struct Connection {
    /// The byte stream, shared with the running background command (if any)
    transport: SharedTransport,

    /// Peer label (for logging)
    peer: String,

    /// Bytes of the current, not yet terminated line
    line_buffer: BytesMut,

    /// The outstanding background command
    pending: Option<BackgroundTask>,

    /// Set once the session is over
    closed: bool,

    /// Server statistics (shared)
    stats: Arc<ServerStats>,
}

impl Connection {
    /// Creates a connection and greets the client.
    ///
    /// Writes the welcome banner (if not empty), a usage hint and the first
    /// prompt.
    ///
    /// # Arguments
    ///
    /// * `transport` - The byte stream for this client
    /// * `welcome` - Banner text; empty for none
    /// * `stats` - Shared server statistics
    pub fn new(transport: Box<dyn Transport>, welcome: &str, stats: Arc<ServerStats>) -> Self {
        let peer = transport.peer().to_owned();
        stats.connection_opened();
        info!(client = %peer, "Client connected");

        let connection = Self {
            transport: traits::share(transport),
            peer,
            line_buffer: BytesMut::with_capacity(256),
            pending: None,
            closed: false,
            stats,
        };

        if !welcome.is_empty() {
            connection.write_str(welcome);
            connection.write_str("\n");
        }
        connection.write_str(USAGE_HINT);
        connection.write_str(BANNER_RULE);
        connection.write_str(PROMPT);

        connection
    }

    /// Runs one update tick.
    ///
    /// Never blocks on the client or on a background command.
    pub fn update(&mut self, registry: &Arc<CommandRegistry>) -> ConnectionStatus {
        if self.closed {
            return ConnectionStatus::Ended;
        }

        if let Some(poll) = self.pending.as_mut().map(BackgroundTask::poll) {
            match poll {
                TaskPoll::Running => {
                    if self.connected() {
                        return ConnectionStatus::Alive;
                    }

                    debug!(client = %self.peer, "Client went away during background command");
                    self.close();
                    return ConnectionStatus::Ended;
                }
                TaskPoll::Completed(result) => {
                    if let Some(task) = self.pending.take() {
                        debug!(
                            client = %self.peer,
                            command = task.name(),
                            elapsed_ms = task.elapsed().as_millis() as u64,
                            ok = result.is_ok(),
                            "Background command finished"
                        );
                    }

                    if let Err(e) = result {
                        self.report_failure(&e);
                    }
                    self.write_str(PROMPT);
                }
            }
        }

        while self.available() > 0 {
            let Some(byte) = self.read_byte() else {
                break;
            };

            match byte {
                NEWLINE => {
                    let outcome = self.process_line(registry);
                    trace!(client = %self.peer, ?outcome, "Line processed");

                    if outcome == Dispatch::Backgrounded {
                        // Remaining input waits in the transport until the command is done.
                        return ConnectionStatus::Alive;
                    }
                    self.write_str(PROMPT);
                }
                CARRIAGE_RETURN => {}
                EOF_BYTE => {
                    debug!(client = %self.peer, "Client sent EOF");
                    self.write_str(GOODBYE_MESSAGE);
                    self.close();
                    return ConnectionStatus::Ended;
                }
                _ => {
                    if self.line_buffer.len() == LINE_SIZE_LIMIT {
                        warn!(
                            client = %self.peer,
                            limit = LINE_SIZE_LIMIT,
                            "Line buffer size exceeded"
                        );
                        self.write_str(OVERFLOW_MESSAGE);
                        self.close();
                        return ConnectionStatus::Ended;
                    }

                    self.line_buffer.put_u8(byte);
                }
            }
        }

        if self.connected() {
            ConnectionStatus::Alive
        } else {
            ConnectionStatus::Ended
        }
    }

    /// Returns true while the session is open and the client reachable.
    pub fn connected(&self) -> bool {
        !self.closed && traits::lock(&self.transport).connected()
    }

    /// Ends the session and terminates the transport.
    pub fn close(&mut self) {
        self.closed = true;
        traits::lock(&self.transport).stop();
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        if !self.connected() {
            ConnectionState::Closed
        } else if self.pending.is_some() {
            ConnectionState::CommandRunning
        } else {
            ConnectionState::AwaitingInput
        }
    }

    /// Peer label.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Number of bytes in the unterminated line.
    pub fn buffered_len(&self) -> usize {
        self.line_buffer.len()
    }

    /// Runs every `;`-separated command of the buffered line.
    fn process_line(&mut self, registry: &Arc<CommandRegistry>) -> Dispatch {
        let line_bytes = self.line_buffer.split();
        let line = String::from_utf8_lossy(&line_bytes);
        self.stats.line_processed();

        for segment in split_commands(&line) {
            match self.process_command(segment, registry) {
                Dispatch::Done => {}
                // Anything after a background command on the same line is dropped.
                other => return other,
            }
        }

        Dispatch::Done
    }

    /// Resolves and runs a single command segment.
    fn process_command(&mut self, segment: &str, registry: &Arc<CommandRegistry>) -> Dispatch {
        let Some(Invocation { name, args }) = Invocation::parse(segment) else {
            trace!(client = %self.peer, "Empty command segment");
            return Dispatch::Failed;
        };

        let Some(handler) = registry.lookup(&name) else {
            debug!(client = %self.peer, command = %name, "Unknown command");
            self.stats.unknown_command();
            self.write_str(&not_found_message(&name));
            return Dispatch::Failed;
        };

        self.stats.command_dispatched();
        let mut output = Output::new(Arc::clone(&self.transport));
        let context = CommandContext::new(Arc::clone(&self.transport), Arc::clone(registry));

        if handler.is_background() {
            debug!(client = %self.peer, command = %name, "Starting background command");
            let handler = Arc::clone(handler);
            self.pending = Some(BackgroundTask::spawn(name, move || {
                handler.execute_with(&mut output, &args, &context)
            }));
            return Dispatch::Backgrounded;
        }

        debug!(client = %self.peer, command = %name, args = args.len(), "Executing command");
        let result: CommandResult = handler.execute_with(&mut output, &args, &context);

        match result {
            Ok(()) => Dispatch::Done,
            Err(e) => {
                self.report_failure(&e);
                Dispatch::Failed
            }
        }
    }

    fn report_failure(&mut self, error: &CommandError) {
        if error.is_reportable() {
            warn!(client = %self.peer, error = %error, "Command failed");
            self.write_str(&format!("Error: {}\n", error));
        } else {
            debug!(client = %self.peer, "Command failed");
        }
    }

    fn available(&self) -> usize {
        traits::lock(&self.transport).available()
    }

    fn read_byte(&self) -> Option<u8> {
        traits::lock(&self.transport).read_byte()
    }

    fn write_str(&self, text: &str) {
        if let Err(e) = traits::lock(&self.transport).write(text.as_bytes()) {
            trace!(client = %self.peer, error = %e, "Write failed");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(task) = &self.pending {
            // Detach: the worker finishes on its own and its output goes nowhere.
            debug!(
                client = %self.peer,
                command = task.name(),
                "Detaching background command from dropped connection"
            );
        }
        self.stats.connection_closed();
    }
}
