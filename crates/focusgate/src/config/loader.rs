//! Configuration file loading for Focusgate
//!
//! Parses TOML through the config crate and validates the result before
//! handing it out, so a bad file fails at load time rather than mid-scan.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{Config, ConfigError};

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.blocked_apps.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "blocked_apps contains an empty name".to_string(),
            ));
        }
        if self.blocker.scan_interval <= 0.0 {
            return Err(ConfigError::Invalid(
                "blocker.scan_interval must be positive".to_string(),
            ));
        }
        if self.runner.timeout <= 0.0 || self.runner.compile_timeout <= 0.0 {
            return Err(ConfigError::Invalid(
                "runner timeouts must be positive".to_string(),
            ));
        }
        if self.watchdog.poll_interval <= 0.0 {
            return Err(ConfigError::Invalid(
                "watchdog.poll_interval must be positive".to_string(),
            ));
        }
        if self.watchdog.max_restarts_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "watchdog.max_restarts_per_minute must be at least 1".to_string(),
            ));
        }

        // Validate all languages have required fields
        for (tag, lang) in &self.languages {
            if lang.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{tag}' has empty name"
                )));
            }
            if lang.extension.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{tag}' has empty extension"
                )));
            }
            if lang.run.command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{tag}' has empty run command"
                )));
            }
            if let Some(ref compile) = lang.compile
                && compile.command.is_empty()
            {
                return Err(ConfigError::Invalid(format!(
                    "language '{tag}' has empty compile command"
                )));
            }
        }

        Ok(())
    }
}
