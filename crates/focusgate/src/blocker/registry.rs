//! Current-user process table
//!
//! Uses the sysinfo crate for cross-platform process enumeration. Every query
//! is filtered to processes owned by the current user; focusgate never touches
//! other users' sessions.

use std::collections::HashMap;

use sysinfo::{Pid, ProcessRefreshKind, System, UpdateKind};

/// Identity snapshot for one process.
///
/// Name plus start time is stable for the lifetime of a pid, so comparing a
/// stored identity against a fresh one detects both exit and pid reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: String,
    pub start_time: u64,
}

/// One row of the filtered process table
pub struct ProcessEntry<'a> {
    pub pid: u32,
    pub name: &'a str,
    pub exe_basename: Option<&'a str>,
    pub start_time: u64,
}

/// Snapshot of the OS process table, filtered to the current user
pub struct ProcessRegistry {
    system: System,
    current_uid: u32,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            current_uid: nix::unistd::Uid::current().as_raw(),
        }
    }

    /// Re-read the process table. Exited processes drop out of the snapshot.
    pub fn refresh(&mut self) {
        self.system.refresh_processes_specifics(
            ProcessRefreshKind::new()
                .with_user(UpdateKind::Always)
                .with_exe(UpdateKind::Always),
        );
    }

    /// Iterate processes owned by the current user
    pub fn user_processes(&self) -> impl Iterator<Item = ProcessEntry<'_>> {
        self.system
            .processes()
            .iter()
            .filter(|(_, process)| {
                process
                    .user_id()
                    .is_some_and(|uid| **uid == self.current_uid)
            })
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name(),
                exe_basename: process
                    .exe()
                    .and_then(|path| path.file_name())
                    .and_then(|name| name.to_str()),
                start_time: process.start_time(),
            })
    }

    /// Look up the identity of a pid, if it is still in the snapshot
    pub fn identity(&self, pid: u32) -> Option<ProcessIdentity> {
        self.system
            .process(Pid::from_u32(pid))
            .map(|process| ProcessIdentity {
                pid,
                name: process.name().to_string(),
                start_time: process.start_time(),
            })
    }

    /// Map each requested name to the pids of matching current-user processes.
    ///
    /// A process matches on its table name or on the basename of its
    /// executable, case-insensitively. Names with no matches are omitted.
    pub fn find_by_name(&self, names: &[String]) -> HashMap<String, Vec<u32>> {
        let mut results: HashMap<String, Vec<u32>> = HashMap::new();
        for entry in self.user_processes() {
            let process_name = entry.name.to_lowercase();
            let exe_name = entry.exe_basename.map(str::to_lowercase);
            for requested in names {
                let wanted = requested.to_lowercase();
                if process_name == wanted || exe_name.as_deref() == Some(wanted.as_str()) {
                    results.entry(requested.clone()).or_default().push(entry.pid);
                }
            }
        }
        results
    }

    /// Whether any current-user process matches the given name
    pub fn is_running(&self, name: &str) -> bool {
        !self.find_by_name(std::slice::from_ref(&name.to_string())).is_empty()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
