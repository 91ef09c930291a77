//! Built-in Commands
//!
//! Every server registers these two at construction:
//!
//! - `help`: lists the registered commands
//! - `quit`: closes the invoking connection

use crate::commands::handler::{CommandError, CommandHandler, CommandResult};
use crate::connection::{CommandContext, Output};
use std::fmt::Write;

/// `help` - prints the number of commands followed by one name per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelpCommand;

impl CommandHandler for HelpCommand {
    /// Always fails with [`CommandError::NoContext`].
    ///
    /// The handler holds no registry of its own; the command list reaches it
    /// only through the [`CommandContext`] a connection passes to
    /// [`execute_with`](CommandHandler::execute_with), which always succeeds.
    fn execute(&self, _out: &mut Output, _args: &[String]) -> CommandResult {
        Err(CommandError::NoContext)
    }

    fn execute_with(&self, out: &mut Output, _args: &[String], ctx: &CommandContext) -> CommandResult {
        let registry = ctx.registry();

        // A client that went away mid-listing is not a command failure.
        let _ = writeln!(out, "List of commands ({})", registry.len());
        for name in registry.names() {
            let _ = writeln!(out, "{}", name);
        }

        Ok(())
    }
}

/// `quit` - closes the connection it was typed on.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuitCommand;

impl CommandHandler for QuitCommand {
    fn execute(&self, _out: &mut Output, _args: &[String]) -> CommandResult {
        Err(CommandError::NoContext)
    }

    fn execute_with(&self, _out: &mut Output, _args: &[String], ctx: &CommandContext) -> CommandResult {
        ctx.close();
        Ok(())
    }
}
