//! Suspend/resume signal delivery
//!
//! Thin wrappers over SIGSTOP/SIGCONT with the error split the scan loop cares
//! about: a target that vanished mid-flight is not the same failure as one we
//! are not allowed to touch.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("process {pid} no longer exists")]
    Vanished { pid: u32 },

    #[error("not permitted to signal process {pid}")]
    Denied { pid: u32 },

    #[error("failed to signal process {pid}: {source}")]
    Failed {
        pid: u32,
        #[source]
        source: Errno,
    },
}

impl SignalError {
    /// True when the target exited before the signal could be delivered
    #[must_use]
    pub fn is_vanished(&self) -> bool {
        matches!(self, SignalError::Vanished { .. })
    }

    fn from_errno(pid: u32, errno: Errno) -> Self {
        match errno {
            Errno::ESRCH => SignalError::Vanished { pid },
            Errno::EPERM => SignalError::Denied { pid },
            errno => SignalError::Failed { pid, source: errno },
        }
    }
}

/// Suspend a process with SIGSTOP
pub fn suspend(pid: u32) -> Result<(), SignalError> {
    send(pid, Signal::SIGSTOP)
}

/// Resume a process with SIGCONT
pub fn resume(pid: u32) -> Result<(), SignalError> {
    send(pid, Signal::SIGCONT)
}

fn send(pid: u32, signal: Signal) -> Result<(), SignalError> {
    kill(Pid::from_raw(pid as i32), signal).map_err(|errno| SignalError::from_errno(pid, errno))
}
