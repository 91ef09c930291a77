//! Command Line Tokenizer
//!
//! Turns the text of a completed line into command invocations.
//!
//! ## How a Line Is Split
//!
//! ```text
//! "set led 1 ; uptime;help"
//!        │
//!        │ split_commands()   (on ';', left to right)
//!        ▼
//! ["set led 1 ", " uptime", "help"]
//!        │
//!        │ tokenize()          (on whitespace)
//!        ▼
//! [["set", "led", "1"], ["uptime"], ["help"]]
//! ```
//!
//! Neither step keeps any state, and neither step fails: an empty segment
//! simply yields an empty token list, which the connection treats as a
//! malformed line.

use crate::protocol::types::COMMAND_SEPARATOR;

/// Splits command text into whitespace-delimited tokens.
///
/// Runs of whitespace collapse, and leading or trailing whitespace
/// produces no empty tokens.
///
/// # Example
///
/// ```
/// use lineshell::protocol::tokenize;
///
/// assert_eq!(tokenize("  echo  hello world "), vec!["echo", "hello", "world"]);
/// assert!(tokenize("   ").is_empty());
/// ```
pub fn tokenize(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_owned).collect()
}

/// Splits a line into its `;`-separated command segments, in order.
///
/// Every separator produces a segment boundary, so `"a;"` yields two
/// segments, the second one empty.
pub fn split_commands(line: &str) -> impl Iterator<Item = &str> {
    line.split(COMMAND_SEPARATOR)
}

/// A tokenized command invocation: the command name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The command name (first token)
    pub name: String,
    /// Remaining tokens
    pub args: Vec<String>,
}

impl Invocation {
    /// Tokenizes a single segment.
    ///
    /// Returns `None` if the segment holds no tokens at all.
    pub fn parse(segment: &str) -> Option<Self> {
        let mut tokens = tokenize(segment).into_iter();
        let name = tokens.next()?;

        Some(Self {
            name,
            args: tokens.collect(),
        })
    }
}
