// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman swap`

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use volman_core::application::swap::{swap, SwapOptions};
use volman_core::application::ProjectContext;

#[derive(Args)]
pub struct SwapArgs {
    /// Swap to an empty volume
    #[arg(long)]
    empty: bool,

    /// Skip the safety backup of the current contents
    #[arg(long)]
    no_backup: bool,

    /// Restart containers after the swap
    #[arg(long)]
    restart: bool,

    /// Service whose volume is swapped
    #[arg(value_name = "SERVICE")]
    service: String,

    /// Archive to populate the fresh volume from
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,
}

pub async fn run(ctx: &ProjectContext, args: SwapArgs, quiet: bool) -> Result<()> {
    let opts = SwapOptions {
        empty: args.empty,
        no_backup: args.no_backup,
        restart: args.restart,
        service: args.service,
        source: args.source,
    };
    let outcome = swap(ctx, &opts).await?;

    for warning in &outcome.warnings {
        eprintln!("{} {warning}", "Warning:".yellow());
    }
    if !quiet {
        if opts.empty || opts.source.is_none() {
            println!("{} Swapped to empty volume: {}", "✓".green(), outcome.volume);
        } else {
            println!("{} Swapped volume: {}", "✓".green(), outcome.volume);
        }
        if let Some(backup_path) = &outcome.backup_path {
            println!("Previous data backed up to: {}", backup_path.display());
        }
    }
    Ok(())
}
