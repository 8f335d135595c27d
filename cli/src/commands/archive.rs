// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman archive`

use crate::output::finish_report;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use volman_core::application::archive::{archive_volumes, ArchiveOptions};
use volman_core::application::ProjectContext;

#[derive(Args)]
pub struct ArchiveArgs {
    /// Archive directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Verify archive integrity before deleting the volume
    #[arg(long)]
    verify: bool,

    /// Skip confirmation; also archives in-use volumes
    #[arg(long)]
    force: bool,

    /// Services or volumes to archive; empty means the whole project
    #[arg(value_name = "SERVICE")]
    services: Vec<String>,
}

pub async fn run(ctx: &ProjectContext, args: ArchiveArgs, quiet: bool) -> Result<()> {
    let opts = ArchiveOptions {
        output: args.output,
        verify: args.verify,
        force: args.force,
        services: args.services,
    };
    let report = archive_volumes(ctx, &opts).await?;
    finish_report(&report, quiet)
}
