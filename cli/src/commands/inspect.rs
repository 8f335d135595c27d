// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman inspect`

use crate::output::format_timestamp;
use anyhow::Result;
use clap::{Args, ValueEnum};
use volman_core::application::inspect::{inspect, VolumeReport};
use volman_core::application::ProjectContext;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InspectFormat {
    Table,
    Json,
    Yaml,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: InspectFormat,

    /// Service or volume to inspect
    #[arg(value_name = "SERVICE")]
    target: String,
}

pub async fn run(ctx: &ProjectContext, args: InspectArgs) -> Result<()> {
    let report = inspect(ctx, &args.target).await?;

    match args.format {
        InspectFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        InspectFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
        InspectFormat::Table => print_table(&report),
    }
    Ok(())
}

fn print_table(report: &VolumeReport) {
    println!("Volume: {}", report.volume.name);
    println!("Driver: {}", report.volume.driver);
    println!("Mountpoint: {}", report.volume.mountpoint);
    println!("Created: {}", format_timestamp(report.volume.created_at));
    println!(
        "Status: {}",
        if report.in_use { "in-use" } else { "unused" }
    );
    if let Some(service) = &report.service {
        println!("Service: {service}");
    }
    if !report.containers.is_empty() {
        println!("Used by: {}", report.containers.join(", "));
    }
    if let Some(metadata) = &report.metadata {
        if metadata.last_accessed.is_some() {
            println!("Last accessed: {}", format_timestamp(metadata.last_accessed));
        }
        if metadata.last_backup.is_some() {
            println!("Last backup: {}", format_timestamp(metadata.last_backup));
        }
        println!("Backup count: {}", metadata.backup_count);
    }
}
