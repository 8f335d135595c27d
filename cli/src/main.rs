// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # volman CLI
//!
//! Volume lifecycle manager for container projects: backup, restore, swap,
//! archive and clean named volumes declared by a Compose definition.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::warn;

use volman_core::application::ProjectContext;
use volman_core::config::Config;
use volman_core::infrastructure::docker::DockerEngine;
use volman_core::infrastructure::metadata::SqliteMetadataStore;

mod commands;
mod exit;
mod output;
mod prompt;

use commands::{
    ArchiveArgs, BackupArgs, CleanArgs, CloneArgs, HistoryArgs, InspectArgs, ListArgs,
    RestoreArgs, SwapArgs,
};

/// Manage the lifecycle of your project's container volumes
#[derive(Parser)]
#[command(name = "volman")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Definition (compose) file path
    #[arg(short = 'f', long = "file", global = true, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Project name override
    #[arg(short = 'p', long = "project", global = true, value_name = "NAME")]
    project: Option<String>,

    /// Skip definition-file integration
    #[arg(long = "no-compose", global = true)]
    no_compose: bool,

    /// Config file path
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List volumes
    #[command(alias = "ls")]
    List(ListArgs),

    /// Backup volumes
    Backup(BackupArgs),

    /// Restore volumes from backup
    Restore(RestoreArgs),

    /// Archive and delete volumes
    Archive(ArchiveArgs),

    /// Replace a volume's contents end to end
    Swap(SwapArgs),

    /// Clean up unused or stale volumes
    Clean(CleanArgs),

    /// Show backup history
    History(HistoryArgs),

    /// Show detailed volume information
    Inspect(InspectArgs),

    /// Clone a volume under a new name
    Clone(CloneArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{} {e:#}", "Error:".red());
        return ExitCode::from(1);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red());
            ExitCode::from(exit::code_for(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path).context("failed to load configuration")?;
    config
        .ensure_directories()
        .context("failed to create data directories")?;

    let engine = DockerEngine::connect().context(
        "failed to connect to Docker; is the daemon running and the socket accessible?",
    )?;

    let store = SqliteMetadataStore::open(Config::default_store_path())
        .await
        .context("failed to open metadata store")?;

    let mut ctx = ProjectContext::new(
        Arc::new(engine),
        Arc::new(store),
        Arc::new(prompt::TerminalPrompter),
        config,
    );

    if !cli.no_compose {
        if let Err(e) = ctx.load_project(cli.file.as_deref(), cli.project.as_deref()) {
            // Several commands work fine without a project; the ones that
            // need one fail with a definition error of their own.
            warn!("could not load project definition: {e}");
        }
    }

    let quiet = cli.quiet;
    match cli.command {
        Commands::List(args) => commands::list::run(&ctx, args).await,
        Commands::Backup(args) => commands::backup::run(&ctx, args, quiet).await,
        Commands::Restore(args) => commands::restore::run(&ctx, args, quiet).await,
        Commands::Archive(args) => commands::archive::run(&ctx, args, quiet).await,
        Commands::Swap(args) => commands::swap::run(&ctx, args, quiet).await,
        Commands::Clean(args) => commands::clean::run(&ctx, args, quiet).await,
        Commands::History(args) => commands::history::run(&ctx, args).await,
        Commands::Inspect(args) => commands::inspect::run(&ctx, args).await,
        Commands::Clone(args) => commands::clone::run(&ctx, args, quiet).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
