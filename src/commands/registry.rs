//! Command Registry
//!
//! Maps command names to their handlers.
//!
//! Names are case-sensitive and unique: registering a name twice replaces
//! the earlier entry without complaint. Entries are never removed.
//!
//! The registry is kept behind an `Arc` by the server. Registering clones
//! it on write if a background command still holds the old snapshot, so
//! a running command always sees a consistent registry.

use crate::commands::handler::CommandHandler;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Declared type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    U8,
    Int,
    Bool,
    Str,
}

/// Describes one positional parameter of a command.
///
/// Informational only: arguments are handed to the handler as raw tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub data_type: DataType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A registered command.
#[derive(Clone)]
pub struct CommandEntry {
    parameters: Vec<Parameter>,
    handler: Arc<dyn CommandHandler>,
}

impl CommandEntry {
    /// Declared parameters, in order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The handler.
    pub fn handler(&self) -> &Arc<dyn CommandHandler> {
        &self.handler
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("parameters", &self.parameters)
            .field("background", &self.handler.is_background())
            .finish()
    }
}

/// Name-to-handler mapping.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandEntry>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any earlier registration.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.register_with_parameters(name, Vec::new(), handler);
    }

    /// Registers `handler` under `name` along with its parameter descriptors.
    pub fn register_with_parameters<H>(
        &mut self,
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        handler: H,
    ) where
        H: CommandHandler + 'static,
    {
        self.commands.insert(
            name.into(),
            CommandEntry {
                parameters,
                handler: Arc::new(handler),
            },
        );
    }

    /// Looks up a handler by exact name.
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.commands.get(name).map(CommandEntry::handler)
    }

    /// Looks up the full entry by exact name.
    pub fn entry(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    /// Iterates over all entries in name order.
    pub fn list(&self) -> impl Iterator<Item = (&str, &CommandEntry)> {
        self.commands.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Iterates over all command names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
