//! Background Command Tasks
//!
//! A background command runs on a worker thread and reports back through
//! a oneshot channel. The update loop only ever polls the receiving end,
//! so checking on a task never blocks.
//!
//! ## Lifecycle
//!
//! ```text
//! spawn() ──> Running ──(worker returns)──> Completed(result)
//!                 │
//!                 └──(worker panics)──────> Completed(Err(Failed))
//! ```
//!
//! There is no cancellation. Dropping a [`BackgroundTask`] detaches the
//! worker; it runs to completion and its result is discarded.

use crate::commands::{CommandError, CommandResult};
use std::time::{Duration, Instant};
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{trace, warn};

/// Result of polling a [`BackgroundTask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPoll {
    Running,
    Completed(CommandResult),
}

/// Handle to one in-flight background command.
#[derive(Debug)]
pub struct BackgroundTask {
    /// Command name (for logging)
    name: String,
    receiver: oneshot::Receiver<CommandResult>,
    started_at: Instant,
}

impl BackgroundTask {
    /// Starts `job` off the calling thread.
    ///
    /// Uses tokio's blocking pool when called inside a runtime, and a
    /// dedicated thread otherwise.
    pub fn spawn<F>(name: impl Into<String>, job: F) -> Self
    where
        F: FnOnce() -> CommandResult + Send + 'static,
    {
        let name = name.into();
        let (sender, receiver) = oneshot::channel();

        let work = move || {
            // The receiver is gone if the connection was dropped; nothing to report then.
            let _ = sender.send(job());
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(work);
            }
            Err(_) => {
                let spawned = std::thread::Builder::new()
                    .name(format!("cmd-{}", name))
                    .spawn(work);

                // On failure the closure, and with it the sender, is dropped,
                // so the next poll reports the command as failed.
                if let Err(e) = spawned {
                    warn!(command = %name, error = %e, "Failed to start background command");
                }
            }
        }

        trace!(command = %name, "Background command started");

        Self {
            name,
            receiver,
            started_at: Instant::now(),
        }
    }

    /// Checks for completion without blocking.
    pub fn poll(&mut self) -> TaskPoll {
        match self.receiver.try_recv() {
            Ok(result) => TaskPoll::Completed(result),
            Err(TryRecvError::Empty) => TaskPoll::Running,
            Err(TryRecvError::Closed) => {
                warn!(command = %self.name, "Background command ended without a result");
                TaskPoll::Completed(Err(CommandError::Failed))
            }
        }
    }

    /// Name of the command being run.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time since the task was started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
