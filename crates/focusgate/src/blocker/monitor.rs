//! The blocking engine: periodic scan, suspension tracking, release.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::blocker::registry::{ProcessEntry, ProcessRegistry};
use crate::blocker::signals;
use crate::blocker::{BlockerError, SignalError};

type BlockCallback = Arc<dyn Fn(&SuspendedProcess) + Send + Sync>;

/// A process the blocker has suspended and is responsible for resuming.
///
/// `name` and `start_time` are captured at suspension so a later resume can
/// confirm the pid still belongs to the same process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuspendedProcess {
    pub pid: u32,
    pub name: String,
    pub start_time: u64,
    pub suspended_at: SystemTime,
}

/// Suspends restricted applications until they are explicitly released.
///
/// The scan runs on its own tokio task at a fixed interval. The restricted
/// set can be swapped at any time; a scan only ever sees a complete set.
/// Dropping a running blocker aborts the scan and best-effort resumes
/// everything it still tracks.
pub struct ProcessBlocker {
    shared: Arc<BlockerShared>,
    scan_interval: Duration,
    match_exe_basename: bool,
    scan_task: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

struct BlockerShared {
    /// Restricted names, stored lowercase
    restricted: Mutex<HashSet<String>>,
    suspended: Mutex<HashMap<u32, SuspendedProcess>>,
    on_block: Mutex<Option<BlockCallback>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProcessBlocker {
    pub fn new(restricted: impl IntoIterator<Item = String>) -> Self {
        Self {
            shared: Arc::new(BlockerShared {
                restricted: Mutex::new(normalize(restricted)),
                suspended: Mutex::new(HashMap::new()),
                on_block: Mutex::new(None),
            }),
            scan_interval: Duration::from_secs(1),
            match_exe_basename: true,
            scan_task: None,
            shutdown: None,
        }
    }

    /// Set the interval between scans (default 1 second)
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Also match processes by executable basename (default true)
    pub fn with_exe_matching(mut self, enabled: bool) -> Self {
        self.match_exe_basename = enabled;
        self
    }

    /// Register the callback invoked once for each newly suspended process.
    ///
    /// The callback runs on the scan task after internal locks are released;
    /// it must return promptly so the next scan is not delayed.
    pub fn on_blocked(&self, callback: impl Fn(&SuspendedProcess) + Send + Sync + 'static) {
        *lock(&self.shared.on_block) = Some(Arc::new(callback));
    }

    /// Start the periodic scan. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Result<(), BlockerError> {
        if self.scan_task.is_some() {
            return Err(BlockerError::AlreadyRunning);
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let interval = self.scan_interval;
        let match_exe = self.match_exe_basename;

        let task = tokio::spawn(async move {
            let mut registry = ProcessRegistry::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => scan_once(&mut registry, &shared, match_exe),
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("scan loop stopped");
        });

        self.scan_task = Some(task);
        self.shutdown = Some(shutdown_tx);
        info!(interval = ?self.scan_interval, "blocker started");
        Ok(())
    }

    /// Whether the scan task is currently running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scan_task.is_some()
    }

    /// Stop scanning and release everything still suspended.
    ///
    /// The release runs even if the scan task is already gone, so no process
    /// is left suspended by this component. Returns the number of processes
    /// released or confirmed exited.
    pub async fn stop(&mut self) -> usize {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(task) = self.scan_task.take()
            && let Err(error) = task.await
        {
            warn!(%error, "scan task did not shut down cleanly");
        }
        let released = self.unblock_all();
        info!(released, "blocker stopped");
        released
    }

    /// Atomically replace the restricted set.
    ///
    /// Processes already suspended under a removed name stay suspended until
    /// the next `unblock_all`.
    pub fn update_restricted(&self, names: impl IntoIterator<Item = String>) {
        let names = normalize(names);
        info!(count = names.len(), "restricted set updated");
        *lock(&self.shared.restricted) = names;
    }

    /// Snapshot of the restricted names
    #[must_use]
    pub fn restricted(&self) -> Vec<String> {
        lock(&self.shared.restricted).iter().cloned().collect()
    }

    /// Snapshot of the currently suspended processes
    #[must_use]
    pub fn suspended(&self) -> Vec<SuspendedProcess> {
        lock(&self.shared.suspended).values().cloned().collect()
    }

    /// Resume every suspended process and clear the tracked set.
    ///
    /// Identity is re-checked before each resume; entries whose process has
    /// exited (or whose pid now belongs to someone else) are skipped as
    /// already gone. The tracked set is cleared unconditionally, even when a
    /// delivery fails. Returns the number of processes resumed or confirmed
    /// gone.
    pub fn unblock_all(&self) -> usize {
        let drained: Vec<SuspendedProcess> = {
            let mut suspended = lock(&self.shared.suspended);
            suspended.drain().map(|(_, record)| record).collect()
        };
        if drained.is_empty() {
            return 0;
        }

        let mut registry = ProcessRegistry::new();
        registry.refresh();

        let mut released = 0;
        for record in drained {
            if !identity_matches(&registry, &record) {
                debug!(pid = record.pid, name = %record.name, "tracked process already gone");
                released += 1;
                continue;
            }
            match signals::resume(record.pid) {
                Ok(()) => {
                    debug!(pid = record.pid, name = %record.name, "resumed");
                    released += 1;
                }
                Err(error) if error.is_vanished() => {
                    released += 1;
                }
                Err(error) => {
                    warn!(pid = record.pid, name = %record.name, %error, "failed to resume");
                }
            }
        }
        info!(released, "released suspended processes");
        released
    }
}

impl Drop for ProcessBlocker {
    fn drop(&mut self) {
        if let Some(task) = self.scan_task.take() {
            task.abort();
        }
        let leftover = lock(&self.shared.suspended).len();
        if leftover > 0 {
            warn!(leftover, "blocker dropped while holding suspensions, resuming");
            self.unblock_all();
        }
    }
}

fn normalize(names: impl IntoIterator<Item = String>) -> HashSet<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

fn identity_matches(registry: &ProcessRegistry, record: &SuspendedProcess) -> bool {
    registry.identity(record.pid).is_some_and(|identity| {
        identity.name == record.name && identity.start_time == record.start_time
    })
}

fn entry_matches(restricted: &HashSet<String>, entry: &ProcessEntry<'_>, match_exe: bool) -> bool {
    if restricted.contains(&entry.name.to_lowercase()) {
        return true;
    }
    match_exe
        && entry
            .exe_basename
            .is_some_and(|basename| restricted.contains(&basename.to_lowercase()))
}

/// One full pass over the process table.
///
/// Never aborts early: a failure against one process is logged and the rest
/// of the table is still visited.
fn scan_once(registry: &mut ProcessRegistry, shared: &BlockerShared, match_exe: bool) {
    let restricted = lock(&shared.restricted).clone();
    registry.refresh();

    let own_pid = std::process::id();
    let mut newly_blocked = Vec::new();
    {
        let mut suspended = lock(&shared.suspended);

        // Forget entries whose process exited or whose pid was reused
        suspended.retain(|_, record| {
            let alive = identity_matches(registry, record);
            if !alive {
                debug!(pid = record.pid, name = %record.name, "suspended process exited");
            }
            alive
        });

        for entry in registry.user_processes() {
            // Never suspend ourselves
            if entry.pid == own_pid {
                continue;
            }
            if suspended.contains_key(&entry.pid) {
                continue;
            }
            if !entry_matches(&restricted, &entry, match_exe) {
                continue;
            }
            match signals::suspend(entry.pid) {
                Ok(()) => {
                    let record = SuspendedProcess {
                        pid: entry.pid,
                        name: entry.name.to_string(),
                        start_time: entry.start_time,
                        suspended_at: SystemTime::now(),
                    };
                    info!(pid = record.pid, name = %record.name, "suspended restricted process");
                    suspended.insert(record.pid, record.clone());
                    newly_blocked.push(record);
                }
                Err(error) if error.is_vanished() => {
                    debug!(pid = entry.pid, "process exited before suspend");
                }
                Err(error @ SignalError::Denied { .. }) => {
                    warn!(pid = entry.pid, name = entry.name, %error, "suspend denied");
                }
                Err(error) => {
                    warn!(pid = entry.pid, name = entry.name, %error, "failed to suspend");
                }
            }
        }
    }

    // Callbacks run outside the locks so a slow observer cannot stall state
    if newly_blocked.is_empty() {
        return;
    }
    let callback = lock(&shared.on_block).clone();
    if let Some(callback) = callback {
        for record in &newly_blocked {
            callback(record);
        }
    }
}
