// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman restore`

use crate::output::{finish_report, format_size};
use anyhow::Result;
use clap::Args;
use volman_core::application::restore::{restore, restore_candidates, RestoreOptions};
use volman_core::application::ProjectContext;
use volman_core::infrastructure::archive::file_size;

#[derive(Args)]
pub struct RestoreArgs {
    /// Select the backup interactively
    #[arg(short, long)]
    select: bool,

    /// List available backups and exit
    #[arg(short, long)]
    list: bool,

    /// Skip confirmation prompts
    #[arg(long)]
    force: bool,

    /// Restart containers after restore
    #[arg(long)]
    restart: bool,

    /// Service name, volume name, or backup file path
    #[arg(value_name = "TARGET")]
    target: Option<String>,
}

pub async fn run(ctx: &ProjectContext, args: RestoreArgs, quiet: bool) -> Result<()> {
    if args.list {
        let target = args.target.as_deref().unwrap_or_default();
        let files = restore_candidates(ctx, target).await?;
        if files.is_empty() {
            println!("No backups found for {target}");
            return Ok(());
        }
        println!("Available backups for {target}:");
        for (i, file) in files.iter().enumerate() {
            let size = file_size(file).unwrap_or(0);
            println!(
                "  {}. {} ({})",
                i + 1,
                file.file_name().unwrap_or_default().to_string_lossy(),
                format_size(size)
            );
        }
        return Ok(());
    }

    let opts = RestoreOptions {
        select: args.select,
        force: args.force,
        restart: args.restart,
        target: args.target,
    };
    let report = restore(ctx, &opts).await?;
    finish_report(&report, quiet)
}
