//! Command Handler Trait
//!
//! Every command, built-in or user-supplied, is a value implementing
//! [`CommandHandler`]. The connection resolves a name to a handler through
//! the registry and calls it with an [`Output`] sink and the argument
//! tokens that followed the name.
//!
//! ## Two Entry Points
//!
//! ```text
//! execute(out, args)            context-free; every handler implements this
//! execute_with(out, args, ctx)  what the connection calls; forwards to
//!                               execute() unless the handler needs the
//!                               session (e.g. `quit` closing it)
//! ```
//!
//! ## Background Commands
//!
//! A handler returning `true` from [`CommandHandler::is_background`] is run
//! on a worker thread. The connection stops reading input until it
//! finishes, then prints the prompt. Handlers are `Send + Sync` for this
//! reason.

use crate::connection::{CommandContext, Output};
use thiserror::Error;

/// Outcome of one command invocation.
pub type CommandResult = Result<(), CommandError>;

/// Ways a command can fail.
///
/// Any failure aborts the remaining `;`-chained commands on the line, but
/// never closes the connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command failed and has already said why (or has nothing to say)
    #[error("command failed")]
    Failed,

    /// The arguments could not be used
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The command needs a session context but was run without one
    #[error("this command can only run inside a session")]
    NoContext,
}

impl CommandError {
    /// Creates an `InvalidArguments` error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        CommandError::InvalidArguments(msg.into())
    }

    /// Returns true if the connection should print this error.
    ///
    /// `Failed` is silent: the handler has written its own diagnostics.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, CommandError::Failed)
    }
}

/// A named command's behavior.
pub trait CommandHandler: Send + Sync {
    /// Runs the command without access to the invoking session.
    fn execute(&self, out: &mut Output, args: &[String]) -> CommandResult;

    /// Runs the command with access to the invoking session.
    fn execute_with(&self, out: &mut Output, args: &[String], _ctx: &CommandContext) -> CommandResult {
        self.execute(out, args)
    }

    /// Whether the command must run off the main update loop.
    fn is_background(&self) -> bool {
        false
    }
}

impl<F> CommandHandler for F
where
    F: Fn(&mut Output, &[String]) -> CommandResult + Send + Sync,
{
    fn execute(&self, out: &mut Output, args: &[String]) -> CommandResult {
        self(out, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use std::fmt::Write;

    #[test]
    fn test_closure_handler() {
        let (transport, peer) = MemoryTransport::pair();
        let mut out = Output::from_transport(Box::new(transport));

        let handler = |out: &mut Output, args: &[String]| -> CommandResult {
            writeln!(out, "{}", args.len()).map_err(|_| CommandError::Failed)
        };

        assert!(handler.execute(&mut out, &["a".into(), "b".into()]).is_ok());
        assert!(!handler.is_background());
        assert_eq!(peer.output_string(), "2\n");
    }

    #[test]
    fn test_error_reporting() {
        assert!(!CommandError::Failed.is_reportable());
        assert!(CommandError::NoContext.is_reportable());

        let err = CommandError::invalid_arguments("expected a number");
        assert!(err.is_reportable());
        assert_eq!(err.to_string(), "invalid arguments: expected a number");
    }
}
