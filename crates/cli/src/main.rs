//! Shelf CLI - shelf command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shelf_cli::cmd;
use std::path::PathBuf;
use tracing::Level;

/// Shelf - Versioned backups that skip unchanged sources
#[derive(Parser)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Job definitions file (default: $SHELF_CONFIG or ~/.config/shelf/jobs.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive a job's sources if they changed since the last backup
    Backup {
        /// Job name
        #[arg(required_unless_present = "job_flag")]
        job: Option<String>,
        /// Job name (same as the positional argument)
        #[arg(long = "job", value_name = "JOB", conflicts_with = "job")]
        job_flag: Option<String>,
        /// Don't take the per-job lock
        #[arg(long)]
        no_lock: bool,
    },
    /// Restore an archived version of a job
    Restore {
        /// Job name
        job: String,
        /// Version to restore (default: latest)
        #[arg(long)]
        version: Option<u64>,
        /// Directory to extract into (default: home directory)
        #[arg(long, value_name = "DIR")]
        target: Option<PathBuf>,
        /// Don't take the per-job lock
        #[arg(long)]
        no_lock: bool,
    },
    /// List archived versions of a job
    List {
        /// Job name
        job: String,
    },
    /// List configured jobs
    Jobs,
    /// Inspect the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the config file location
    Path,
    /// Print an example config file
    Example,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Backup {
            job,
            job_flag,
            no_lock,
        } => {
            let job = job.or(job_flag).context("No job name given")?;
            cmd::backup::run(config, &job, no_lock)
        }
        Commands::Restore {
            job,
            version,
            target,
            no_lock,
        } => cmd::restore::run(config, &job, version, target.as_deref(), no_lock),
        Commands::List { job } => cmd::list::run(config, &job),
        Commands::Jobs => cmd::jobs::run(config),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Path => cmd::config::run_path(config),
            ConfigCommands::Example => cmd::config::run_example(),
        },
    }
}
