//! Focusgate CLI
//!
//! Blocks distracting applications behind small coding challenges, and
//! supervises the enforcement process so it survives crashes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use focusgate::{
    Config, EXAMPLE_CONFIG, ExecutionRequest, ProcessBlocker, Runner, TestVector, TypeInfo,
    Watchdog,
};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focusgate")]
#[command(about = "Block distracting applications behind coding challenges")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: focusgate.toml)
        #[arg(short, long, default_value = "focusgate.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Suspend blocked applications until interrupted
    Enforce,

    /// Supervise the enforcement process, restarting it on crash
    Watch {
        /// Command to supervise (default: this binary's `enforce` mode)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Run a challenge submission against test vectors
    Run {
        /// Source file with the submission
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language tag (e.g. python, javascript, php, c)
        #[arg(short, long)]
        language: String,

        /// Entry point function name
        #[arg(short, long)]
        entry: String,

        /// Test vectors as inline JSON, e.g. '[{"input":[2,3],"expected":5}]'
        #[arg(short, long)]
        tests: Option<String>,

        /// File containing the test vectors as JSON
        #[arg(long, conflicts_with = "tests")]
        tests_file: Option<PathBuf>,

        /// Type metadata as JSON for statically typed targets,
        /// e.g. '{"params":["int","int"],"return":"int"}'
        #[arg(long)]
        types: Option<String>,
    },

    /// List available languages
    Languages,

    /// Show the effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Enforce => run_enforce(&config).await,
        Commands::Watch { command } => run_watch(&config, cli.config.as_deref(), command).await,
        Commands::Run {
            source,
            language,
            entry,
            tests,
            tests_file,
            types,
        } => {
            run_challenge(
                &config,
                &source,
                &language,
                &entry,
                tests.as_deref(),
                tests_file.as_deref(),
                types.as_deref(),
            )
            .await
        }
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

/// Resolves on SIGINT or SIGTERM
async fn wait_for_shutdown_signal() -> Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("failed to listen for interrupt")?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

async fn run_enforce(config: &Config) -> Result<()> {
    if config.blocked_apps.is_empty() {
        warn!("no blocked applications configured");
    }

    let mut blocker = ProcessBlocker::new(config.blocked_apps.clone())
        .with_scan_interval(Duration::from_secs_f64(config.blocker.scan_interval))
        .with_exe_matching(config.blocker.match_exe_basename);
    blocker.on_blocked(|process| {
        info!(pid = process.pid, name = %process.name, "blocked application");
    });
    blocker.start().context("failed to start enforcement")?;
    info!(
        apps = config.blocked_apps.len(),
        "enforcement active, stop with Ctrl-C"
    );

    wait_for_shutdown_signal().await?;

    info!("shutting down");
    let released = blocker.stop().await;
    println!("Released {released} suspended process(es)");
    Ok(())
}

async fn run_watch(
    config: &Config,
    config_path: Option<&Path>,
    command: Vec<String>,
) -> Result<()> {
    // Precedence: command line, then [watchdog].command, then our own enforce
    let command = if !command.is_empty() {
        command
    } else if !config.watchdog.command.is_empty() {
        config.watchdog.command.clone()
    } else {
        default_enforce_command(config_path)?
    };

    let settings = &config.watchdog;
    let mut watchdog = Watchdog::new(command)
        .with_poll_interval(Duration::from_secs_f64(settings.poll_interval))
        .with_grace_period(Duration::from_secs_f64(settings.grace_period))
        .with_restart_ceiling(settings.max_restarts_per_minute)
        .with_env(settings.env.clone());
    if let Some(dir) = &settings.working_dir {
        watchdog = watchdog.with_working_dir(dir);
    }

    let handle = watchdog.shutdown_handle();
    tokio::spawn(async move {
        if wait_for_shutdown_signal().await.is_ok() {
            handle.shutdown();
        }
    });

    watchdog.run().await.context("supervision ended")
}

/// Supervise this binary's own enforce mode when no command is given
fn default_enforce_command(config_path: Option<&Path>) -> Result<Vec<String>> {
    let exe = std::env::current_exe().context("failed to resolve current executable")?;
    let mut command = vec![exe.to_string_lossy().into_owned(), "enforce".to_string()];
    if let Some(path) = config_path {
        command.push("--config".to_string());
        command.push(path.to_string_lossy().into_owned());
    }
    Ok(command)
}

async fn run_challenge(
    config: &Config,
    source: &PathBuf,
    language: &str,
    entry: &str,
    tests: Option<&str>,
    tests_file: Option<&Path>,
    types: Option<&str>,
) -> Result<()> {
    let source_content = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;

    let vectors: Vec<TestVector> = if let Some(json) = tests {
        serde_json::from_str(json).context("failed to parse --tests")?
    } else if let Some(path) = tests_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .context("failed to read tests file")?;
        serde_json::from_str(&raw).context("failed to parse tests file")?
    } else {
        Vec::new()
    };

    let mut request = ExecutionRequest::new(language, source_content, entry).with_vectors(vectors);
    if let Some(json) = types {
        let info: TypeInfo = serde_json::from_str(json).context("failed to parse --types")?;
        request = request.with_types(info);
    }

    info!(language, entry, "running submission");
    let runner = Runner::new(config.clone());
    let outcome = runner.run_tests(&request).await;

    let rendered = serde_json::to_string_pretty(&outcome).context("failed to render outcome")?;
    println!("{rendered}");

    if outcome.success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    let mut languages: Vec<_> = config.languages.iter().collect();
    languages.sort_by_key(|(tag, _)| *tag);

    for (tag, language) in languages {
        let kind = if language.is_compiled() {
            "compiled"
        } else {
            "interpreted"
        };
        println!("  {:<12} {} ({})", tag, language.name, kind);
    }
}

fn show_config(config: &Config) {
    if config.blocked_apps.is_empty() {
        println!("Blocked applications: (none)");
    } else {
        println!("Blocked applications: {}", config.blocked_apps.join(", "));
    }
    println!();
    println!("Blocker:");
    println!("  Scan interval: {}s", config.blocker.scan_interval);
    println!(
        "  Match executable basename: {}",
        config.blocker.match_exe_basename
    );
    println!();
    println!("Runner:");
    println!("  Timeout: {}s", config.runner.timeout);
    println!("  Compile timeout: {}s", config.runner.compile_timeout);
    println!();
    println!("Watchdog:");
    println!("  Poll interval: {}s", config.watchdog.poll_interval);
    println!(
        "  Restart ceiling: {}/min",
        config.watchdog.max_restarts_per_minute
    );
    println!("  Grace period: {}s", config.watchdog.grace_period);
    println!();
    println!("Languages configured: {}", config.languages.len());
}

async fn init_config(output: &PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
