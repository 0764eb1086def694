//! The supervision loop
//!
//! An explicit state machine: `Stopped → Starting → Running`, then
//! `Restarting` on child exit or back to `Stopped` on shutdown, spawn
//! failure, or crash loop. The child runs in its own process group with
//! stdout and stderr captured into bounded tails for exit diagnosis.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::watchdog::WatchdogError;
use crate::watchdog::window::RestartWindow;

/// Bytes of child output kept for exit diagnosis
const TAIL_LIMIT: usize = 500;

/// Where the supervisor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Stopped,
    Starting,
    Running,
    Restarting,
}

/// Requests a graceful stop of a running [`Watchdog`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

struct SupervisedChild {
    child: Child,
    stdout_tail: Arc<Mutex<Vec<u8>>>,
    stderr_tail: Arc<Mutex<Vec<u8>>>,
}

/// Keeps a target command running until shutdown or crash loop
pub struct Watchdog {
    command: Vec<String>,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
    poll_interval: Duration,
    grace_period: Duration,
    window: RestartWindow,
    state: WatchdogState,
    restart_count: u64,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Watchdog {
    pub fn new(command: Vec<String>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            command,
            working_dir: None,
            env: HashMap::new(),
            poll_interval: Duration::from_secs(3),
            grace_period: Duration::from_secs(5),
            window: RestartWindow::new(Duration::from_secs(60), 10),
            state: WatchdogState::Stopped,
            restart_count: 0,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Set the child's working directory (default: inherit)
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add environment variables on top of the inherited environment
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Set the liveness poll interval (default 3 seconds)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set how long a terminated child may linger before a kill (default 5 seconds)
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    /// Set the restart ceiling within the sliding minute (default 10)
    pub fn with_restart_ceiling(mut self, ceiling: u32) -> Self {
        self.window = RestartWindow::new(self.window.span(), ceiling);
        self
    }

    /// Handle for requesting shutdown from another task or a signal handler
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    #[must_use]
    pub fn state(&self) -> WatchdogState {
        self.state
    }

    /// Restarts performed since `run` began
    #[must_use]
    pub fn restart_count(&self) -> u64 {
        self.restart_count
    }

    /// Supervise until shutdown is requested or supervision fails.
    ///
    /// Returns `Ok(())` after a graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::SpawnFailed`] when a spawn fails twice in a
    /// row, and [`WatchdogError::CrashLoopDetected`] when restarts hit the
    /// window ceiling. Both are terminal.
    #[instrument(skip(self), fields(command = ?self.command))]
    pub async fn run(&mut self) -> Result<(), WatchdogError> {
        if self.command.is_empty() {
            return Err(WatchdogError::EmptyCommand);
        }
        info!(
            interval = ?self.poll_interval,
            grace = ?self.grace_period,
            "watchdog starting"
        );

        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut supervised = self.spawn_supervised()?;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match supervised.child.try_wait() {
                        Ok(None) => {}
                        Ok(Some(status)) => {
                            self.log_exit(&supervised, status);
                            self.set_state(WatchdogState::Restarting);
                            if !self.window.try_record(Instant::now()) {
                                self.set_state(WatchdogState::Stopped);
                                return Err(WatchdogError::CrashLoopDetected {
                                    restarts: self.window.len(),
                                    window_secs: self.window.span().as_secs(),
                                });
                            }
                            self.restart_count += 1;
                            info!(restart = self.restart_count, "restarting supervised process");
                            supervised = self.spawn_supervised()?;
                        }
                        Err(error) => warn!(%error, "failed to poll supervised process"),
                    }
                }
                _ = shutdown_rx.changed() => {
                    info!("shutdown requested");
                    self.set_state(WatchdogState::Stopped);
                    self.shutdown_child(supervised).await;
                    return Ok(());
                }
            }
        }
    }

    /// Spawn the child, retrying once before giving up.
    fn spawn_supervised(&mut self) -> Result<SupervisedChild, WatchdogError> {
        self.set_state(WatchdogState::Starting);
        let supervised = match self.try_spawn() {
            Ok(supervised) => supervised,
            Err(first) => {
                warn!(error = %first, "spawn failed, retrying once");
                match self.try_spawn() {
                    Ok(supervised) => supervised,
                    Err(source) => {
                        self.set_state(WatchdogState::Stopped);
                        return Err(WatchdogError::SpawnFailed { source });
                    }
                }
            }
        };
        if let Some(pid) = supervised.child.id() {
            info!(pid, "supervised process started");
        }
        self.set_state(WatchdogState::Running);
        Ok(supervised)
    }

    fn try_spawn(&self) -> Result<SupervisedChild, std::io::Error> {
        let (program, args) = self.command.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")
        })?;

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn()?;
        let stdout_tail = Arc::new(Mutex::new(Vec::new()));
        let stderr_tail = Arc::new(Mutex::new(Vec::new()));
        if let Some(stdout) = child.stdout.take() {
            capture_tail(stdout, Arc::clone(&stdout_tail));
        }
        if let Some(stderr) = child.stderr.take() {
            capture_tail(stderr, Arc::clone(&stderr_tail));
        }

        Ok(SupervisedChild {
            child,
            stdout_tail,
            stderr_tail,
        })
    }

    fn log_exit(&self, supervised: &SupervisedChild, status: ExitStatus) {
        warn!(code = ?status.code(), "supervised process exited");
        let stdout = String::from_utf8_lossy(&lock(&supervised.stdout_tail)).into_owned();
        if !stdout.trim().is_empty() {
            warn!(tail = %stdout.trim(), "child stdout before exit");
        }
        let stderr = String::from_utf8_lossy(&lock(&supervised.stderr_tail)).into_owned();
        if !stderr.trim().is_empty() {
            warn!(tail = %stderr.trim(), "child stderr before exit");
        }
    }

    /// Terminate, wait out the grace period, then kill.
    async fn shutdown_child(&self, mut supervised: SupervisedChild) {
        let Some(pid) = supervised.child.id() else {
            // Already exited; reap it
            let _ = supervised.child.try_wait();
            return;
        };

        info!(pid, "terminating supervised process");
        if let Err(errno) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
            && errno != Errno::ESRCH
        {
            warn!(pid, error = %errno, "failed to deliver SIGTERM");
        }

        match tokio::time::timeout(self.grace_period, supervised.child.wait()).await {
            Ok(Ok(status)) => debug!(code = ?status.code(), "child exited within grace period"),
            Ok(Err(error)) => warn!(%error, "failed to await child during shutdown"),
            Err(_) => {
                warn!(pid, "grace period expired, killing");
                if let Err(error) = supervised.child.kill().await {
                    warn!(pid, %error, "failed to kill child");
                }
            }
        }
    }

    fn set_state(&mut self, next: WatchdogState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "watchdog state changed");
            self.state = next;
        }
    }
}

/// Drain a child stream into a bounded tail buffer.
fn capture_tail(
    mut stream: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    tail: Arc<Mutex<Vec<u8>>>,
) {
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let mut tail = lock(&tail);
                    tail.extend_from_slice(&buf[..n]);
                    let excess = tail.len().saturating_sub(TAIL_LIMIT);
                    if excess > 0 {
                        tail.drain(..excess);
                    }
                }
            }
        }
    });
}
