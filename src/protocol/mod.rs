//! Line Protocol Implementation
//!
//! This module holds the text side of the wire contract: how raw lines
//! become command invocations, and the fixed texts the server writes back.
//!
//! ## Modules
//!
//! - `types`: protocol constants (prompt, control bytes, line limit, messages)
//! - `tokenizer`: splitting lines into `;`-separated segments and tokens
//!
//! ## Example
//!
//! ```
//! use lineshell::protocol::{split_commands, Invocation};
//!
//! let invocations: Vec<_> = split_commands("echo hi; uptime")
//!     .filter_map(Invocation::parse)
//!     .collect();
//!
//! assert_eq!(invocations[0].name, "echo");
//! assert_eq!(invocations[0].args, vec!["hi"]);
//! assert_eq!(invocations[1].name, "uptime");
//! ```

pub mod tokenizer;
pub mod types;

// Re-export commonly used items for convenience
pub use tokenizer::{split_commands, tokenize, Invocation};
pub use types::{
    not_found_message, EOF_BYTE, GOODBYE_MESSAGE, LINE_SIZE_LIMIT, OVERFLOW_MESSAGE, PROMPT,
};
