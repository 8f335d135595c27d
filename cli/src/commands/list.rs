// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman list`

use crate::output::{csv_line, format_timestamp};
use anyhow::Result;
use clap::{Args, ValueEnum};
use tabled::{Table, Tabled};
use volman_core::application::list::{list_volumes, ListOptions};
use volman_core::application::ProjectContext;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    Table,
    Json,
    Csv,
}

#[derive(Args)]
pub struct ListArgs {
    /// Show all volumes, not just this project's
    #[arg(short, long)]
    all: bool,

    /// Show only unused volumes
    #[arg(short, long)]
    unused: bool,

    /// Show volumes not accessed for N days
    #[arg(long, value_name = "DAYS")]
    stale: Option<u32>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    format: ListFormat,
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "SERVICE")]
    service: String,
    #[tabled(rename = "VOLUME")]
    volume: String,
    #[tabled(rename = "LAST_USED")]
    last_used: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

pub async fn run(ctx: &ProjectContext, args: ListArgs) -> Result<()> {
    let opts = ListOptions {
        all: args.all,
        unused: args.unused,
        stale_days: args.stale,
    };
    let items = list_volumes(ctx, &opts).await?;

    if items.is_empty() {
        println!("No volumes found.");
        return Ok(());
    }

    match args.format {
        ListFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        ListFormat::Csv => {
            println!("{}", csv_line(&["service", "volume", "last_used", "status"]));
            for item in &items {
                println!(
                    "{}",
                    csv_line(&[
                        item.service.as_deref().unwrap_or(""),
                        &item.volume,
                        &format_timestamp(item.last_used),
                        status(item.in_use),
                    ])
                );
            }
        }
        ListFormat::Table => {
            let rows: Vec<ListRow> = items
                .iter()
                .map(|item| ListRow {
                    service: item.service.clone().unwrap_or_else(|| "-".to_string()),
                    volume: item.volume.clone(),
                    last_used: format_timestamp(item.last_used),
                    status: status(item.in_use).to_string(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
    }

    Ok(())
}

fn status(in_use: bool) -> &'static str {
    if in_use {
        "in-use"
    } else {
        "unused"
    }
}
