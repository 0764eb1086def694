//! Challenge execution engine
//!
//! Synthesizes a per-language driver program around submitted code and runs
//! it in a short-lived, time-bounded child process.

use std::time::Duration;

use thiserror::Error;
use tracing::instrument;

pub use crate::runner::execute::run_driver;

mod execute;
mod harness;

use crate::config::Config;
use crate::types::{ExecutionOutcome, ExecutionRequest};

/// Errors that occur while preparing or running a submission
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("unsupported language '{language}'")]
    UnsupportedLanguage { language: String },

    #[error("language '{language}' requires type information")]
    MissingTypeInfo { language: String },

    #[error("invalid entry point name '{name}'")]
    InvalidEntryPoint { name: String },

    #[error("cannot express value in typed driver: {detail}")]
    UnsupportedValue { detail: String },

    #[error("execution timed out after {seconds} seconds")]
    Timeout { seconds: f64 },

    #[error("compilation failed: {stderr}")]
    CompileFailed { stderr: String },

    #[error("driver failed: {stderr}")]
    RuntimeFault { stderr: String },

    #[error("invalid output: {raw}")]
    OutputParse { raw: String },

    #[error("failed to encode test vectors: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to spawn driver process: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// High-level runner for challenge submissions
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every test vector and fold any failure into the outcome.
    ///
    /// This never returns an error: preparation and execution failures become
    /// an outcome with `success = false`, a diagnostic `error`, and empty
    /// `results`. A timeout is reported as `ExecutionTimedOut`; a child that
    /// exits non-zero surfaces its captured stderr verbatim.
    #[instrument(skip(self, request), fields(language = %request.language, vectors = request.vectors.len()))]
    pub async fn run_tests(&self, request: &ExecutionRequest) -> ExecutionOutcome {
        match self.try_run_tests(request).await {
            Ok(outcome) => outcome,
            Err(RunnerError::Timeout { .. }) => ExecutionOutcome::failed("ExecutionTimedOut"),
            Err(RunnerError::RuntimeFault { stderr }) => ExecutionOutcome::failed(stderr),
            Err(error) => ExecutionOutcome::failed(error.to_string()),
        }
    }

    /// Run every test vector, surfacing the failure class to the caller
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::UnsupportedLanguage`] or
    /// [`RunnerError::MissingTypeInfo`] before any process is spawned,
    /// [`RunnerError::CompileFailed`] when a compile step fails,
    /// [`RunnerError::Timeout`] when the driver exceeds the configured
    /// timeout, [`RunnerError::RuntimeFault`] when it exits non-zero, and
    /// [`RunnerError::OutputParse`] when its output is not a valid report.
    pub async fn try_run_tests(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome, RunnerError> {
        let language = self.config.languages.get(&request.language).ok_or_else(|| {
            RunnerError::UnsupportedLanguage {
                language: request.language.clone(),
            }
        })?;

        let driver = harness::generate(request, language)?;
        let report = execute::run_driver(
            language,
            &driver,
            Duration::from_secs_f64(self.config.runner.timeout),
            Duration::from_secs_f64(self.config.runner.compile_timeout),
        )
        .await?;

        Ok(ExecutionOutcome::from_report(report))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::TestVector;

    #[test]
    fn runner_defaults_cover_all_languages() {
        let runner = Runner::with_defaults();
        for tag in ["python", "javascript", "php", "c"] {
            assert!(runner.config().languages.contains_key(tag));
        }
    }

    #[tokio::test]
    async fn unknown_language_fails_before_spawn() {
        let runner = Runner::with_defaults();
        let request = ExecutionRequest::new("cobol", "IDENTIFICATION DIVISION.", "main");

        let error = runner
            .try_run_tests(&request)
            .await
            .expect_err("cobol should be rejected");
        assert!(matches!(
            error,
            RunnerError::UnsupportedLanguage { ref language } if language == "cobol"
        ));

        let outcome = runner.run_tests(&request).await;
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().is_some_and(|e| e.contains("unsupported language")));
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn c_without_type_info_fails_before_spawn() {
        let runner = Runner::with_defaults();
        let request = ExecutionRequest::new("c", "int add(int a, int b) { return a + b; }", "add")
            .with_vectors(vec![TestVector::new(json!([1, 2]), json!(3))]);

        let error = runner
            .try_run_tests(&request)
            .await
            .expect_err("c without types should be rejected");
        assert!(matches!(error, RunnerError::MissingTypeInfo { .. }));
    }

    #[tokio::test]
    async fn bad_entry_point_fails_before_spawn() {
        let runner = Runner::with_defaults();
        let request = ExecutionRequest::new("python", "x = 1", "f(); import os");

        let error = runner
            .try_run_tests(&request)
            .await
            .expect_err("entry point with punctuation should be rejected");
        assert!(matches!(error, RunnerError::InvalidEntryPoint { .. }));
    }
}
