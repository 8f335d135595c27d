// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman backup`

use crate::output::finish_report;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use volman_core::application::backup::{backup, BackupOptions};
use volman_core::application::ProjectContext;

#[derive(Args)]
pub struct BackupArgs {
    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Compression format: tar.gz/tar.zst/tar
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Skip compression
    #[arg(long)]
    no_compress: bool,

    /// Tag for the backup records
    #[arg(short, long)]
    tag: Option<String>,

    /// Stop containers before backup
    #[arg(long)]
    stop: bool,

    /// Services or volumes to back up; empty means the whole project
    #[arg(value_name = "SERVICE")]
    services: Vec<String>,
}

pub async fn run(ctx: &ProjectContext, args: BackupArgs, quiet: bool) -> Result<()> {
    let opts = BackupOptions {
        output: args.output,
        format: args.format,
        no_compress: args.no_compress,
        tag: args.tag,
        stop: args.stop,
        services: args.services,
    };
    let report = backup(ctx, &opts).await?;
    finish_report(&report, quiet)
}
