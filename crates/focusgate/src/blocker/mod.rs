//! Application blocking via process suspension
//!
//! This module owns the enforcement side of focusgate: a periodic scan of the
//! current user's process table that suspends any process whose name is in the
//! restricted set, keeps track of what it suspended, and resumes everything on
//! release.

use thiserror::Error;

pub use crate::blocker::monitor::{ProcessBlocker, SuspendedProcess};
pub use crate::blocker::registry::{ProcessIdentity, ProcessRegistry};
pub use crate::blocker::signals::SignalError;

mod monitor;
mod registry;
mod signals;

/// Errors from blocker lifecycle operations
#[derive(Debug, Error)]
pub enum BlockerError {
    #[error("blocker is already running")]
    AlreadyRunning,
}
