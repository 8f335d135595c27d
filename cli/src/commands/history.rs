// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `volman history`

use crate::output::{format_size, format_timestamp};
use anyhow::Result;
use clap::Args;
use tabled::{Table, Tabled};
use volman_core::application::history::{history, HistoryOptions, DEFAULT_HISTORY_LIMIT};
use volman_core::application::ProjectContext;

#[derive(Args)]
pub struct HistoryArgs {
    /// Number of records to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    limit: i64,

    /// Show records from all projects
    #[arg(short, long)]
    all: bool,

    /// Service or volume to show history for
    #[arg(value_name = "SERVICE")]
    service: Option<String>,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "SERVICE")]
    service: String,
    #[tabled(rename = "TIMESTAMP")]
    timestamp: String,
    #[tabled(rename = "SIZE")]
    size: String,
    #[tabled(rename = "TAG")]
    tag: String,
    #[tabled(rename = "PATH")]
    path: String,
}

pub async fn run(ctx: &ProjectContext, args: HistoryArgs) -> Result<()> {
    let opts = HistoryOptions {
        limit: args.limit,
        all: args.all,
        service: args.service,
    };
    let records = history(ctx, &opts).await?;

    if records.is_empty() {
        println!("No backup history found");
        return Ok(());
    }

    let rows: Vec<HistoryRow> = records
        .iter()
        .map(|record| {
            let path = if record.file_path.chars().count() > 50 {
                let tail: String = record
                    .file_path
                    .chars()
                    .skip(record.file_path.chars().count() - 47)
                    .collect();
                format!("...{tail}")
            } else {
                record.file_path.clone()
            };
            HistoryRow {
                service: record
                    .service_name
                    .clone()
                    .unwrap_or_else(|| record.volume_name.clone()),
                timestamp: format_timestamp(Some(record.created_at)),
                size: format_size(record.size_bytes),
                tag: record.tag.clone().unwrap_or_else(|| "-".to_string()),
                path,
            }
        })
        .collect();

    println!("{}", Table::new(rows));
    Ok(())
}
