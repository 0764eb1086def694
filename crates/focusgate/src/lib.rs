//! A library for blocking distracting applications behind coding challenges.
//!
//! Focusgate suspends restricted applications until the user solves a small
//! programming challenge, evaluates the submitted solution against test
//! vectors in a short-lived child process, and keeps the enforcement process
//! alive with a supervising watchdog.
//!
//! # Features
//!
//! - **Process blocking**: periodic scans suspend restricted applications owned by the current user.
//! - **Challenge execution**: generated per-language drivers evaluate submissions against test vectors.
//! - **Multi-language**: Python, JavaScript, PHP, and C, with typed vector embedding for C.
//! - **TOML configuration**: blocked applications and per-language interpreter settings.
//! - **Supervision**: the enforcement process is restarted on crash, up to a rate ceiling.

pub use blocker::{BlockerError, ProcessBlocker, ProcessRegistry, SignalError, SuspendedProcess};
pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Language};
pub use runner::{Runner, RunnerError, run_driver};
pub use types::{
    CType, CaseResult, DriverReport, ExecutionOutcome, ExecutionRequest, TestVector, TypeInfo,
};
pub use watchdog::{ShutdownHandle, Watchdog, WatchdogError, WatchdogState};

pub mod blocker;
pub mod config;
pub mod runner;
pub mod types;
pub mod watchdog;
