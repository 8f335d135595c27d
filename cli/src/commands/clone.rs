// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman clone`

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use volman_core::application::clone::{clone_volume, CloneOptions};
use volman_core::application::ProjectContext;

#[derive(Args)]
pub struct CloneArgs {
    /// Service whose volume is cloned
    #[arg(value_name = "SERVICE")]
    service: String,

    /// Name of the new volume
    #[arg(value_name = "NEW_NAME")]
    new_name: String,
}

pub async fn run(ctx: &ProjectContext, args: CloneArgs, quiet: bool) -> Result<()> {
    let opts = CloneOptions {
        service: args.service,
        new_name: args.new_name,
    };
    let outcome = clone_volume(ctx, &opts).await?;

    for warning in &outcome.warnings {
        eprintln!("{} {warning}", "Warning:".yellow());
    }
    if !quiet {
        println!(
            "{} Cloned {} to {}",
            "✓".green(),
            outcome.source,
            outcome.target
        );
    }
    Ok(())
}
