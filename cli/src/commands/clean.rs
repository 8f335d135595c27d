// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman clean`

use crate::output::{finish_report, format_timestamp};
use anyhow::Result;
use clap::Args;
use volman_core::application::clean::{execute_clean, plan_clean, CleanOptions};
use volman_core::application::ProjectContext;

#[derive(Args)]
pub struct CleanArgs {
    /// Clean unused volumes
    #[arg(short, long)]
    unused: bool,

    /// Clean volumes not accessed for N days
    #[arg(long, value_name = "DAYS")]
    stale: Option<u32>,

    /// Show what would be cleaned without doing it
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Archive each volume before deleting it
    #[arg(short, long)]
    archive: bool,

    /// Skip confirmation
    #[arg(long)]
    force: bool,
}

pub async fn run(ctx: &ProjectContext, args: CleanArgs, quiet: bool) -> Result<()> {
    let opts = CleanOptions {
        unused: args.unused,
        stale_days: args.stale,
        dry_run: args.dry_run,
        archive: args.archive,
        force: args.force,
    };

    let candidates = plan_clean(ctx, &opts).await?;
    if candidates.is_empty() {
        if !quiet {
            println!("No volumes to clean");
        }
        return Ok(());
    }

    println!("Volumes to clean ({}):", candidates.len());
    for candidate in &candidates {
        let last_used = match candidate.last_accessed {
            Some(t) => format_timestamp(Some(t)),
            None => "never".to_string(),
        };
        println!("  - {} (last used: {})", candidate.volume, last_used);
    }

    if opts.dry_run {
        println!("\n(Dry run - no changes made)");
        return Ok(());
    }

    let report = execute_clean(ctx, &candidates, &opts).await?;
    finish_report(&report, quiet)
}
