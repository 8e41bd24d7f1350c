//! Userspace SCM CLI - drive a containerized VCS delegate from the shell.
//!
//! Each subcommand maps to one SCM operation. Configuration is loaded once,
//! logging goes to stderr (or rolling files) and results go to stdout, as
//! colored text or JSON. Ctrl-C cancels the running delegate.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::warn;

mod commands;
mod config_bridge;
mod formatter;
mod theme;

use commands::poll::Since;
use commands::{Host, build, changelog, info, poll};
use formatter::OutputFormat;
use theme::Theme;

/// Userspace SCM - checkout, identify and poll through a delegate container
#[derive(Parser)]
#[command(name = "userspace-scm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check out the head and record the resulting revision
    Checkout {
        /// Build identifier
        #[arg(long)]
        build: String,

        /// Workspace directory (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Write the delegate's changelog to this file
        #[arg(long)]
        changelog: Option<PathBuf>,

        /// Earlier build whose revision is the changelog baseline
        #[arg(long)]
        baseline: Option<String>,
    },

    /// Identify the revision checked out in a workspace
    Identify {
        /// Build identifier
        #[arg(long)]
        build: String,

        /// Workspace directory (defaults to the current directory)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Record the revision for the build
        #[arg(long)]
        save: bool,
    },

    /// Ask whether the head moved since a baseline
    Poll {
        /// Job name
        #[arg(long)]
        job: String,

        /// Workspace, when polling is configured to need one
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Compare against the revision recorded for this build
        #[arg(
            long,
            conflicts_with = "since_revision",
            required_unless_present = "since_revision"
        )]
        since_build: Option<String>,

        /// Compare against this revision token
        #[arg(long)]
        since_revision: Option<String>,
    },

    /// Show a changelog written by checkout
    Changelog {
        /// Changelog file
        path: PathBuf,

        /// Build the changelog belongs to
        #[arg(long, default_value = "local")]
        build: String,

        /// Show the file as a single unparsed entry
        #[arg(long)]
        raw: bool,
    },

    /// Print the repository browser link for a revision
    Browse {
        /// Revision token
        revision: String,
    },

    /// Print the SCM identity key
    Key,

    /// Show the effective configuration
    Info,
}

fn workspace_or_cwd(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("failed to determine the current directory"),
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling delegate");
            cancel.cancel();
        }
    });
}

async fn run(cli: Cli) -> Result<()> {
    let resolved = userspace_config::Config::load(cli.config.as_deref())
        .context("failed to load configuration")?;

    let log_config = config_bridge::to_log_config(&resolved.config, cli.verbose);
    if let Err(e) = userspace_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());
    let host = Host::from_config(&resolved.config, cancel, cli.format)?;

    match cli.command {
        Commands::Checkout {
            build: build_id,
            workspace,
            changelog: changelog_path,
            baseline,
        } => {
            let workspace = workspace_or_cwd(workspace)?;
            build::run_checkout(
                &host,
                &build_id,
                &workspace,
                changelog_path.as_deref(),
                baseline.as_deref(),
            )
            .await?;
        },
        Commands::Identify {
            build: build_id,
            workspace,
            save,
        } => {
            let workspace = workspace_or_cwd(workspace)?;
            build::run_identify(&host, &build_id, &workspace, save).await?;
        },
        Commands::Poll {
            job,
            workspace,
            since_build,
            since_revision,
        } => {
            let since = match (since_build, since_revision) {
                (Some(build_id), _) => Since::Build(build_id),
                (None, Some(token)) => Since::Revision(token),
                (None, None) => anyhow::bail!("provide --since-build or --since-revision"),
            };
            poll::run_poll(&host, &job, workspace.as_deref(), &since).await?;
        },
        Commands::Changelog { path, build, raw } => {
            changelog::run_changelog(&host, &path, &build, raw).await?;
        },
        Commands::Browse { revision } => {
            changelog::run_browse(&host, &revision)?;
        },
        Commands::Key => {
            info::show_key(&host)?;
        },
        Commands::Info => {
            info::show_info(&host, &resolved.loaded_files)?;
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", Theme::error(&format!("{e:#}")));
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_poll_requires_a_baseline() {
        let result = Cli::try_parse_from(["userspace-scm", "poll", "--job", "nightly"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from([
            "userspace-scm",
            "poll",
            "--job",
            "nightly",
            "--since-build",
            "b1",
            "--since-revision",
            "r1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "userspace-scm",
            "key",
            "-vv",
            "--format",
            "json",
            "--config",
            "scm.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("scm.toml")));
        assert!(matches!(cli.command, Commands::Key));
    }

    #[test]
    fn test_checkout_args() {
        let cli = Cli::try_parse_from([
            "userspace-scm",
            "checkout",
            "--build",
            "42",
            "--changelog",
            "changes.txt",
            "--baseline",
            "41",
        ])
        .unwrap();
        match cli.command {
            Commands::Checkout {
                build,
                workspace,
                changelog,
                baseline,
            } => {
                assert_eq!(build, "42");
                assert_eq!(workspace, None);
                assert_eq!(changelog, Some(PathBuf::from("changes.txt")));
                assert_eq!(baseline.as_deref(), Some("41"));
            },
            _ => panic!("expected checkout"),
        }
    }
}
