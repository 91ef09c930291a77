//! Stock Commands
//!
//! Ready-made commands for a device shell. None of them are registered
//! automatically; the binary registers all three.
//!
//! - `uptime` - time since the command was created
//! - `echo [args...]` - prints its arguments
//! - `sleep <ms>` - waits in the background, then reports

use crate::commands::handler::{CommandError, CommandHandler, CommandResult};
use crate::commands::registry::{DataType, Parameter};
use crate::connection::Output;
use std::fmt::Write;
use std::time::{Duration, Instant};

/// Largest delay `sleep` accepts.
pub const MAX_SLEEP_MS: u64 = 60_000;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = SECS_PER_MINUTE * 60;
const SECS_PER_DAY: u64 = SECS_PER_HOUR * 24;

/// Formats a duration as `Uptime: <d> days, HH:MM:SS`.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();

    format!(
        "Uptime: {} days, {:02}:{:02}:{:02}",
        secs / SECS_PER_DAY,
        (secs / SECS_PER_HOUR) % 24,
        (secs / SECS_PER_MINUTE) % 60,
        secs % 60
    )
}

/// `uptime`
#[derive(Debug, Clone)]
pub struct UptimeCommand {
    started_at: Instant,
}

impl UptimeCommand {
    pub fn new() -> Self {
        Self::since(Instant::now())
    }

    /// Measures uptime from `started_at` instead of from now.
    pub fn since(started_at: Instant) -> Self {
        Self { started_at }
    }
}

impl Default for UptimeCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHandler for UptimeCommand {
    fn execute(&self, out: &mut Output, _args: &[String]) -> CommandResult {
        writeln!(out, "{}", format_uptime(self.started_at.elapsed())).map_err(|_| CommandError::Failed)
    }
}

/// `echo`
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoCommand;

impl CommandHandler for EchoCommand {
    fn execute(&self, out: &mut Output, args: &[String]) -> CommandResult {
        writeln!(out, "{}", args.join(" ")).map_err(|_| CommandError::Failed)
    }
}

/// `sleep <ms>` - runs in the background.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepCommand;

impl SleepCommand {
    /// Parameter descriptors for registration.
    pub fn parameters() -> Vec<Parameter> {
        vec![Parameter::new("milliseconds", DataType::Int)]
    }
}

impl CommandHandler for SleepCommand {
    fn execute(&self, out: &mut Output, args: &[String]) -> CommandResult {
        let [ms] = args else {
            return Err(CommandError::invalid_arguments("usage: sleep <milliseconds>"));
        };

        let ms: u64 = ms
            .parse()
            .map_err(|_| CommandError::invalid_arguments(format!("'{}' is not a number", ms)))?;

        if ms > MAX_SLEEP_MS {
            return Err(CommandError::invalid_arguments(format!(
                "at most {} ms",
                MAX_SLEEP_MS
            )));
        }

        std::thread::sleep(Duration::from_millis(ms));
        writeln!(out, "Slept {} ms", ms).map_err(|_| CommandError::Failed)
    }

    fn is_background(&self) -> bool {
        true
    }
}
