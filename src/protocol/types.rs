//! Line Protocol Constants
//!
//! The wire contract with remote clients is deliberately tiny:
//!
//! - Input is newline (`\n`) terminated; carriage returns (`\r`) are ignored.
//! - Several commands may share a line, separated by `;`.
//! - A single byte with value 4 (Ctrl-D) ends the session.
//! - The server writes a `> ` prompt after each completed line.
//!
//! All user-visible texts the core writes live here so tests and
//! clients can match on them.

/// Prompt written after every completed line.
pub const PROMPT: &str = "> ";

/// Line terminator.
pub const NEWLINE: u8 = b'\n';

/// Carriage return, tolerated and dropped.
pub const CARRIAGE_RETURN: u8 = b'\r';

/// End-of-transmission control byte (Ctrl-D).
pub const EOF_BYTE: u8 = 4;

/// Separator between chained commands on one line.
pub const COMMAND_SEPARATOR: char = ';';

/// Maximum number of bytes a single line may hold.
///
/// Not configurable at runtime; receiving one more byte than this
/// before a newline closes the connection.
pub const LINE_SIZE_LIMIT: usize = 4096;

/// Usage hint written right after the welcome banner.
pub const USAGE_HINT: &str = "You can type your commands, type 'help' for a list of commands\n";

/// Rule written under the usage hint, before the first prompt.
pub const BANNER_RULE: &str = "===========\n";

/// Written when the client sends the EOF byte.
pub const GOODBYE_MESSAGE: &str = "Goodbye (EOF)\n";

/// Written when a line grows past [`LINE_SIZE_LIMIT`].
pub const OVERFLOW_MESSAGE: &str = "== Line buffer size exceeded, aborting ==\n";

/// Formats the message for an unknown command name.
pub fn not_found_message(name: &str) -> String {
    format!("Command '{}' not found\n", name)
}
