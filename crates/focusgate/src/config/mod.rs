//! Configuration types for focusgate

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::language::{
    CompileConfig, DEFAULT_SANDBOX_PATH, FileExtension, HarnessKind, Language, RunConfig,
};

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../focusgate.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to read config file at {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language '{0}' not found in configuration")]
    LanguageNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Focusgate
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Process names suspended while enforcement is active
    #[serde(default)]
    pub blocked_apps: Vec<String>,

    /// Process blocker settings
    #[serde(default)]
    pub blocker: BlockerConfig,

    /// Challenge runner settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Watchdog settings
    #[serde(default)]
    pub watchdog: WatchdogConfig,

    /// Language configurations keyed by language tag
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

/// Settings for the process blocker
#[derive(Debug, Clone, Deserialize)]
pub struct BlockerConfig {
    /// Seconds between process table scans
    #[serde(default = "default_scan_interval")]
    pub scan_interval: f64,

    /// Also match a process by the basename of its executable path.
    ///
    /// Catches processes whose table name is truncated or differs from the
    /// binary name.
    #[serde(default = "default_true")]
    pub match_exe_basename: bool,
}

impl Default for BlockerConfig {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            match_exe_basename: true,
        }
    }
}

/// Settings for the challenge runner
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Wall-clock budget for one driver run, in seconds
    #[serde(default = "default_run_timeout")]
    pub timeout: f64,

    /// Wall-clock budget for the compile step, in seconds
    #[serde(default = "default_compile_timeout")]
    pub compile_timeout: f64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout: default_run_timeout(),
            compile_timeout: default_compile_timeout(),
        }
    }
}

/// Settings for the watchdog
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogConfig {
    /// Command to supervise. Empty means the caller picks a default.
    #[serde(default)]
    pub command: Vec<String>,

    /// Seconds between child liveness checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,

    /// Restart ceiling within the sliding 60-second window
    #[serde(default = "default_max_restarts")]
    pub max_restarts_per_minute: u32,

    /// Seconds to wait after a graceful terminate before force-killing
    #[serde(default = "default_grace_period")]
    pub grace_period: f64,

    /// Working directory for the supervised child
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables for the supervised child
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            poll_interval: default_poll_interval(),
            max_restarts_per_minute: default_max_restarts(),
            grace_period: default_grace_period(),
            working_dir: None,
            env: HashMap::new(),
        }
    }
}

impl Config {
    /// Create a new config with embedded default languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no languages and no blocked apps
    pub fn empty() -> Self {
        Self {
            blocked_apps: Vec::new(),
            blocker: BlockerConfig::default(),
            runner: RunnerConfig::default(),
            watchdog: WatchdogConfig::default(),
            languages: HashMap::new(),
        }
    }

    /// Get a language by tag
    pub fn get_language(&self, tag: &str) -> Result<&Language, ConfigError> {
        self.languages
            .get(tag)
            .ok_or_else(|| ConfigError::LanguageNotFound(tag.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_scan_interval() -> f64 {
    1.0
}

fn default_run_timeout() -> f64 {
    3.0
}

fn default_compile_timeout() -> f64 {
    10.0
}

fn default_poll_interval() -> f64 {
    3.0
}

fn default_max_restarts() -> u32 {
    10
}

fn default_grace_period() -> f64 {
    5.0
}

fn default_true() -> bool {
    true
}
