// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Archive workflow: backup, then delete the volume.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::application::report::WorkflowReport;
use crate::application::prompt::Prompter;
use crate::domain::engine::{ContainerEngine, DataMoverSpec, MoverMount};
use crate::domain::store::{MetadataStore, NewBackupRecord};
use crate::infrastructure::archive;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Output directory; defaults to the project's archive directory.
    pub output: Option<PathBuf>,
    /// Surface the archive checksum before deleting the volume.
    pub verify: bool,
    pub force: bool,
    /// Explicit targets; empty means every project volume.
    pub services: Vec<String>,
}

pub async fn archive_volumes(
    ctx: &ProjectContext,
    opts: &ArchiveOptions,
) -> Result<WorkflowReport, LifecycleError> {
    let mut report = WorkflowReport::new();

    let volumes = if opts.services.is_empty() {
        let volumes = ctx.project_volumes()?;
        if volumes.is_empty() {
            report.warn("no volumes found in project");
            return Ok(report);
        }
        volumes
    } else {
        let mut volumes = Vec::new();
        for service in &opts.services {
            match ctx.resolve_volume(service).await {
                Ok(volume) => volumes.push(volume),
                Err(e) => report.warn(format!("{service} not found, skipping ({e})")),
            }
        }
        volumes
    };

    if volumes.is_empty() {
        report.warn("no volumes to archive");
        return Ok(report);
    }

    if !opts.force {
        let listing = volumes.join(", ");
        let prompt =
            format!("This will archive and DELETE the following volumes: {listing}. Continue?");
        if !ctx.prompter.confirm(&prompt) {
            return Err(LifecycleError::Cancelled);
        }
    }

    let output_dir = opts.output.clone().unwrap_or_else(|| ctx.archive_dir());
    archive::ensure_directory(&output_dir)?;

    for volume in volumes {
        match archive_one(ctx, &volume, &output_dir, opts, &mut report).await {
            Ok(detail) => report.succeeded(&volume, detail),
            Err(e) => report.failed(&volume, e),
        }
    }

    Ok(report)
}

async fn archive_one(
    ctx: &ProjectContext,
    volume: &str,
    output_dir: &Path,
    opts: &ArchiveOptions,
    report: &mut WorkflowReport,
) -> Result<String, LifecycleError> {
    if !ctx.engine.volume_exists(volume).await? {
        return Err(LifecycleError::VolumeNotFound(volume.to_string()));
    }

    let in_use = ctx.engine.volume_in_use(volume).await?;
    if in_use {
        let containers = ctx.engine.containers_using(volume).await?;
        if !opts.force {
            return Err(LifecycleError::InUse {
                volume: volume.to_string(),
                containers,
            });
        }
        warn!(volume = %volume, ?containers, "archiving an in-use volume (forced)");
        report.warn(format!("volume {volume} is in use; proceeding (forced)"));
    }

    let format = ctx.config.defaults.compress_format.clone();
    let file_name = archive::backup_filename(volume, &format);
    let output_path = output_dir.join(&file_name);

    let bind_dir = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.to_path_buf());
    let spec = DataMoverSpec::new(
        archive::tar_create_command(&format),
        vec![
            MoverMount::volume(volume, "/source", true),
            MoverMount::bind(bind_dir.display().to_string(), "/backup", false),
        ],
    );
    ctx.engine.run_data_mover(spec).await?;
    archive::move_or_copy(&output_dir.join(archive::staging_filename(&format)), &output_path)?;

    // --verify gates deletion on the archive being complete and hashable;
    // it does not re-extract to prove round-trip correctness.
    let checksum = if opts.verify {
        let checksum = archive::file_checksum(&output_path)?;
        info!(volume = %volume, %checksum, "archive verified");
        Some(checksum)
    } else {
        match archive::file_checksum(&output_path) {
            Ok(checksum) => Some(checksum),
            Err(e) => {
                report.warn(format!("checksum computation failed for {file_name}: {e}"));
                None
            }
        }
    };

    let size_bytes = archive::file_size(&output_path).unwrap_or(0);
    let record = NewBackupRecord {
        volume_name: volume.to_string(),
        service_name: ctx.service_for_volume(volume),
        project_name: Some(ctx.project_name.clone()),
        file_path: output_path.display().to_string(),
        size_bytes,
        tag: Some("archive".to_string()),
        checksum,
    };
    if let Err(e) = ctx.store.append_backup_record(record).await {
        report.warn(LifecycleError::persistence("archive", e).to_string());
    }
    if let Err(e) = ctx.store.touch_last_backup(volume).await {
        report.warn(LifecycleError::persistence("archive", e).to_string());
    }

    info!(volume = %volume, "deleting archived volume");
    ctx.engine.remove_volume(volume, opts.force).await?;

    Ok(output_path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedPrompter, TestHarness};

    const DB_SERVICE: &str = "\
services:
  db:
    image: postgres
    volumes:
      - data:/var/lib/postgresql/data
";

    #[tokio::test]
    async fn test_archive_backs_up_then_deletes() {
        let harness = TestHarness::new();
        harness.engine.create_volume("p_data").await.unwrap();
        let ctx = harness.context("p", Some(DB_SERVICE));

        let opts = ArchiveOptions { force: true, ..Default::default() };
        let report = archive_volumes(&ctx, &opts).await.unwrap();
        assert!(report.is_success(), "failures: {:?}", report.failures);
        assert!(!harness.engine.volumes.lock().unwrap().contains("p_data"));

        let records = harness.store.records.lock().unwrap();
        assert_eq!(records[0].tag.as_deref(), Some("archive"));
    }

    #[tokio::test]
    async fn test_archive_in_use_refused_without_force() {
        let harness = TestHarness::new();
        harness.engine.create_volume("p_data").await.unwrap();
        harness.engine.add_user("p_data", "db-1");
        let ctx = harness.context("p", Some(DB_SERVICE));

        let opts = ArchiveOptions { force: true, ..Default::default() };
        // force=true skips confirmation but in_use check happens per item
        // only without force; here we test the unforced path.
        let unforced = ArchiveOptions::default();
        let report = archive_volumes(&ctx, &unforced).await.unwrap();
        assert!(!report.is_success());
        assert!(matches!(
            report.failures[0].error,
            LifecycleError::InUse { .. }
        ));
        assert!(harness.engine.volumes.lock().unwrap().contains("p_data"));

        // Forced: proceeds with a warning.
        let report = archive_volumes(&ctx, &opts).await.unwrap();
        assert!(report.is_success());
        assert!(report.warnings.iter().any(|w| w.contains("in use")));
    }

    #[tokio::test]
    async fn test_archive_declined_confirmation_cancels() {
        let harness = TestHarness::with_prompter(ScriptedPrompter::declining());
        harness.engine.create_volume("p_data").await.unwrap();
        let ctx = harness.context("p", Some(DB_SERVICE));

        assert!(matches!(
            archive_volumes(&ctx, &ArchiveOptions::default()).await,
            Err(LifecycleError::Cancelled)
        ));
        assert!(harness.engine.volumes.lock().unwrap().contains("p_data"));
    }

    #[tokio::test]
    async fn test_archive_verify_surfaces_checksum() {
        let harness = TestHarness::new();
        harness.engine.create_volume("p_data").await.unwrap();
        let ctx = harness.context("p", Some(DB_SERVICE));

        let opts = ArchiveOptions { force: true, verify: true, ..Default::default() };
        let report = archive_volumes(&ctx, &opts).await.unwrap();
        assert!(report.is_success());

        let records = harness.store.records.lock().unwrap();
        let checksum = records[0].checksum.as_deref().unwrap();
        assert_eq!(checksum.len(), 64);
    }
}
