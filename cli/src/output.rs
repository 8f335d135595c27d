// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Presentation helpers: size/time formatting, report printing and the
//! table/json/csv renderers.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use volman_core::application::WorkflowReport;

pub fn format_size(bytes: i64) -> String {
    const UNIT: i64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let units = ["KB", "MB", "GB", "TB", "PB", "EB"];
    format!("{:.1} {}", bytes as f64 / div as f64, units[exp])
}

pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(t) => t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Write one CSV line with minimal quoting.
pub fn csv_line(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| {
            if f.contains([',', '"', '\n']) {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Print a workflow report and turn item failures into a non-zero outcome.
pub fn finish_report(report: &WorkflowReport, quiet: bool) -> Result<()> {
    if !quiet {
        for item in &report.completed {
            println!("{} {}: {}", "✓".green(), item.target, item.detail);
        }
    }
    for warning in &report.warnings {
        eprintln!("{} {warning}", "Warning:".yellow());
    }
    for failure in &report.failures {
        eprintln!("{} {}: {}", "Error:".red(), failure.target, failure.error);
    }
    if report.is_success() {
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} target(s) failed",
            report.failures.len(),
            report.failures.len() + report.completed.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_format_timestamp_none() {
        assert_eq!(format_timestamp(None), "-");
    }

    #[test]
    fn test_csv_line_quoting() {
        assert_eq!(csv_line(&["a", "b"]), "a,b");
        assert_eq!(csv_line(&["a,b", "c\"d"]), "\"a,b\",\"c\"\"d\"");
    }
}
