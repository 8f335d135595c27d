// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! History workflow: query the backup ledger.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::domain::store::{BackupRecord, MetadataStore};

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
pub struct HistoryOptions {
    pub limit: i64,
    /// Span every project instead of the current one.
    pub all: bool,
    pub service: Option<String>,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            all: false,
            service: None,
        }
    }
}

pub async fn history(
    ctx: &ProjectContext,
    opts: &HistoryOptions,
) -> Result<Vec<BackupRecord>, LifecycleError> {
    let limit = if opts.limit > 0 { opts.limit } else { DEFAULT_HISTORY_LIMIT };

    if let Some(service) = &opts.service {
        // An unresolvable target may still be a raw volume name the ledger
        // knows about.
        let volume = match ctx.resolve_volume(service).await {
            Ok(volume) => volume,
            Err(_) => service.clone(),
        };
        return Ok(ctx.store.backup_records(Some(&volume), limit).await?);
    }

    if opts.all {
        return Ok(ctx.store.backup_records(None, limit).await?);
    }

    // Current project: filter the full ledger, newest first.
    let records = ctx.store.backup_records(None, 0).await?;
    Ok(records
        .into_iter()
        .filter(|r| r.project_name.as_deref() == Some(ctx.project_name.as_str()))
        .take(limit as usize)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::engine::ContainerEngine;
    use crate::domain::store::NewBackupRecord;
    use crate::testing::TestHarness;

    const DB_SERVICE: &str = "\
services:
  db:
    image: postgres
    volumes:
      - data:/var/lib/postgresql/data
";

    fn new_record(volume: &str, project: &str) -> NewBackupRecord {
        NewBackupRecord {
            volume_name: volume.to_string(),
            service_name: None,
            project_name: Some(project.to_string()),
            file_path: format!("/backups/{volume}_2026-01-01_000000.tar.gz"),
            size_bytes: 1,
            tag: None,
            checksum: None,
        }
    }

    #[tokio::test]
    async fn test_history_for_service_resolves_volume() {
        let harness = TestHarness::new();
        harness.engine.create_volume("p_data").await.unwrap();
        harness
            .store
            .append_backup_record(new_record("p_data", "p"))
            .await
            .unwrap();
        harness
            .store
            .append_backup_record(new_record("q_data", "q"))
            .await
            .unwrap();
        let ctx = harness.context("p", Some(DB_SERVICE));

        let opts = HistoryOptions { service: Some("db".to_string()), ..Default::default() };
        let records = history(&ctx, &opts).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].volume_name, "p_data");
    }

    #[tokio::test]
    async fn test_history_scopes_to_project_by_default() {
        let harness = TestHarness::new();
        harness
            .store
            .append_backup_record(new_record("p_data", "p"))
            .await
            .unwrap();
        harness
            .store
            .append_backup_record(new_record("q_data", "q"))
            .await
            .unwrap();
        let ctx = harness.context("p", Some(DB_SERVICE));

        let records = history(&ctx, &HistoryOptions::default()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].project_name.as_deref(), Some("p"));

        let all = history(&ctx, &HistoryOptions { all: true, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
