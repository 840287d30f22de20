//! # Command Line Interface
//!
//! `secretenv` resolves every secret reference in its own environment, then
//! either replaces itself with the given command or prints the resolved
//! assignments.
//!
//! ```text
//! secretenv [-v] [--json-logs] [--dry-run] [--env-file PATH] [-- COMMAND ARGS...]
//! ```

use crate::config::RunConfig;
use crate::observability::init_logging;
use crate::secrets::{Environment, ProcessEnvironment, ResolvedEnv, SecretEnv};
use crate::{APP_NAME, VERSION};
use anyhow::Context;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "secretenv")]
#[command(about = "Resolve secret references in environment variables")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,

    /// Resolve without modifying the environment and list the keys that would change
    #[arg(long)]
    pub dry_run: bool,

    /// Load variables from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Command to run with the resolved environment
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<OsString>,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            verbose: self.verbose,
            json_logs: self.json_logs,
            dry_run: self.dry_run,
            env_file: self.env_file.clone(),
        }
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.run_config();

    // Must happen before the snapshot so .env entries can hold references too
    config.load_env_file()?;
    init_logging(config.verbose, config.json_logs);

    info!(app_name = APP_NAME, version = VERSION, dry_run = config.dry_run, "Resolving secret references");

    let env = ProcessEnvironment;
    let snapshot = env.snapshot();
    let resolved = SecretEnv::default()
        .resolve_snapshot(&snapshot)
        .await
        .context("Failed to resolve secret references")?;
    let changed: Vec<String> = resolved.changed_keys(&snapshot).map(str::to_owned).collect();

    if config.dry_run {
        for key in &changed {
            println!("{}", key);
        }
        return Ok(());
    }

    env.commit(&resolved.commit_map()).context("Failed to update the environment")?;

    match cli.command.split_first() {
        None => {
            print!("{}", render_assignments(&resolved, &changed));
            Ok(())
        }
        Some((program, args)) => run_command(program, args),
    }
}

/// `KEY=VALUE` lines for the given keys
fn render_assignments(resolved: &ResolvedEnv, keys: &[String]) -> String {
    keys.iter()
        .filter_map(|key| resolved.get(key).map(|value| format!("{}={}\n", key, value.expose_secret())))
        .collect()
}

#[cfg(unix)]
fn run_command(program: &OsString, args: &[OsString]) -> anyhow::Result<()> {
    use std::os::unix::process::CommandExt;

    // Only returns on failure
    let error = std::process::Command::new(program).args(args).exec();
    Err(error).with_context(|| format!("Failed to execute {}", program.to_string_lossy()))
}

#[cfg(not(unix))]
fn run_command(program: &OsString, args: &[OsString]) -> anyhow::Result<()> {
    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to execute {}", program.to_string_lossy()))?;
    std::process::exit(status.code().unwrap_or(1));
}
