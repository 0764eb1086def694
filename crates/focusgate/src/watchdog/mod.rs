//! Process supervision
//!
//! Keeps a target process alive across crashes without masking genuine
//! repeated failure. Crashes are respawned up to a rate ceiling inside a
//! sliding window; deliberate shutdown terminates the child gracefully and
//! is never counted as a crash.

use thiserror::Error;

pub use crate::watchdog::supervise::{ShutdownHandle, Watchdog, WatchdogState};
pub use crate::watchdog::window::RestartWindow;

mod supervise;
mod window;

/// Errors that stop supervision
#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("supervised command is empty")]
    EmptyCommand,

    #[error("failed to spawn supervised process: {source}")]
    SpawnFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("crash loop detected: {restarts} restarts in the last {window_secs} seconds")]
    CrashLoopDetected { restarts: usize, window_secs: u64 },
}
