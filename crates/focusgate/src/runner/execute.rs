//! Sandboxed driver execution
//!
//! Writes the driver into a fresh temporary directory and runs it in a
//! time-bounded child process with a scrubbed environment. Nothing is
//! reused across requests; the directory and the child disappear when the
//! request completes.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::config::{DEFAULT_SANDBOX_PATH, Language};
use crate::runner::RunnerError;
use crate::types::DriverReport;

/// Output name of the compile step, substituted for `{binary}`
const BINARY_NAME: &str = "driver.bin";

/// Run a generated driver and parse its report.
///
/// Compiled languages get a compile step first, bounded by its own timeout;
/// its diagnostics surface as [`RunnerError::CompileFailed`]. The run step
/// is bounded by `run_timeout`, after which the child is killed.
///
/// # Errors
///
/// Returns [`RunnerError::Timeout`] when the run step exceeds its bound,
/// [`RunnerError::RuntimeFault`] when the driver exits non-zero, and
/// [`RunnerError::OutputParse`] when stdout holds no valid report.
#[instrument(skip(language, driver_source), fields(language = %language.name))]
pub async fn run_driver(
    language: &Language,
    driver_source: &str,
    run_timeout: Duration,
    compile_timeout: Duration,
) -> Result<DriverReport, RunnerError> {
    let dir = tempfile::tempdir()?;
    let driver_name = language.driver_name();
    tokio::fs::write(dir.path().join(&driver_name), driver_source).await?;
    debug!(driver = %driver_name, dir = %dir.path().display(), "wrote driver");

    if let Some(compile) = &language.compile {
        let command = Language::expand_command(&compile.command, &driver_name, BINARY_NAME);
        let output = match run_command(
            &command,
            dir.path(),
            &compile.env,
            DEFAULT_SANDBOX_PATH,
            compile_timeout,
        )
        .await
        {
            Ok(output) => output,
            Err(RunnerError::Timeout { seconds }) => {
                return Err(RunnerError::CompileFailed {
                    stderr: format!("compiler timed out after {seconds} seconds"),
                });
            }
            Err(error) => return Err(error),
        };
        if !output.status.success() {
            return Err(RunnerError::CompileFailed {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("compile step succeeded");
    }

    let command = Language::expand_command(&language.run.command, &driver_name, BINARY_NAME);
    let output = run_command(
        &command,
        dir.path(),
        &language.run.env,
        &language.run.path,
        run_timeout,
    )
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            match output.status.code() {
                Some(code) => format!("process exited with code {code}"),
                None => "process terminated by signal".to_string(),
            }
        } else {
            stderr
        };
        return Err(RunnerError::RuntimeFault { stderr });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_report(&stdout).ok_or_else(|| RunnerError::OutputParse {
        raw: stdout.trim().to_string(),
    })
}

/// Spawn one child with a scrubbed environment and wait, bounded by `timeout`.
///
/// `kill_on_drop` reaps the child when the timeout fires and its output
/// future is dropped.
async fn run_command(
    parts: &[String],
    dir: &Path,
    env: &HashMap<String, String>,
    path: &str,
    timeout: Duration,
) -> Result<std::process::Output, RunnerError> {
    let (program, args) = parts.split_first().ok_or_else(|| RunnerError::Spawn {
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
    })?;

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(dir)
        .env_clear()
        .env("PATH", path)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|source| RunnerError::Spawn { source })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(RunnerError::Io(source)),
        Err(_) => Err(RunnerError::Timeout {
            seconds: timeout.as_secs_f64(),
        }),
    }
}

/// Parse the report from stdout, tolerating stray prints before it.
///
/// The whole stream is tried first, then the last non-empty line, which is
/// where every driver writes its report.
fn parse_report(stdout: &str) -> Option<DriverReport> {
    if let Ok(report) = serde_json::from_str(stdout) {
        return Some(report);
    }
    stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| serde_json::from_str(line.trim()).ok())
}
