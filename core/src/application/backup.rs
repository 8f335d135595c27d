// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Backup workflow: archive project volumes and prune old generations.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::application::report::WorkflowReport;
use crate::domain::engine::{ContainerEngine, DataMoverSpec, MoverMount, DEFAULT_STOP_TIMEOUT_SECS};
use crate::domain::store::{MetadataStore, NewBackupRecord};
use crate::infrastructure::archive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    /// Output directory; defaults to the project's backup directory.
    pub output: Option<PathBuf>,
    /// Compression format; defaults to the configured one.
    pub format: Option<String>,
    pub no_compress: bool,
    pub tag: Option<String>,
    /// Stop containers using each volume before archiving it.
    pub stop: bool,
    /// Explicit service/volume targets; empty means every project volume.
    pub services: Vec<String>,
}

/// Run the backup workflow. Per-target failures are collected, never fatal
/// to the batch; only resolution of the target set itself can fail.
pub async fn backup(
    ctx: &ProjectContext,
    opts: &BackupOptions,
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
                Err(e) => {
                    warn!(target = %service, "skipping unresolved backup target");
                    report.warn(format!("{service} not found, skipping ({e})"));
                }
            }
        }
        volumes
    };

    if volumes.is_empty() {
        report.warn("no volumes to backup");
        return Ok(report);
    }

    let output_dir = opts
        .output
        .clone()
        .unwrap_or_else(|| ctx.backup_dir());
    archive::ensure_directory(&output_dir)?;

    for volume in volumes {
        match backup_volume(ctx, &volume, &output_dir, opts, &mut report).await {
            Ok(path) => {
                info!(volume = %volume, path = %path.display(), "backup complete");
                report.succeeded(&volume, path.display().to_string());
            }
            Err(e) => report.failed(&volume, e),
        }
    }

    Ok(report)
}

/// Archive one volume and record it. Returns the produced archive path.
pub(crate) async fn backup_volume(
    ctx: &ProjectContext,
    volume: &str,
    output_dir: &Path,
    opts: &BackupOptions,
    report: &mut WorkflowReport,
) -> Result<PathBuf, LifecycleError> {
    if !ctx.engine.volume_exists(volume).await? {
        return Err(LifecycleError::VolumeNotFound(volume.to_string()));
    }

    let service_name = ctx.service_for_volume(volume);

    if opts.stop {
        let containers = ctx.engine.containers_using(volume).await?;
        if !containers.is_empty() {
            info!(volume = %volume, ?containers, "stopping containers before backup");
            ctx.engine
                .stop_containers(&containers, DEFAULT_STOP_TIMEOUT_SECS)
                .await?;
        }
    }

    let format = effective_format(ctx, opts);
    // The physical volume name keys the filename so services sharing a
    // volume never collide.
    let file_name = archive::backup_filename(volume, &format);
    let output_path = output_dir.join(&file_name);

    run_archive_mover(ctx, volume, output_dir, &format).await?;
    archive::move_or_copy(&output_dir.join(archive::staging_filename(&format)), &output_path)?;

    let size_bytes = archive::file_size(&output_path).unwrap_or(0);
    let checksum = match archive::file_checksum(&output_path) {
        Ok(checksum) => Some(checksum),
        Err(e) => {
            // Integrity warning only: the archive itself was written.
            report.warn(format!("checksum computation failed for {file_name}: {e}"));
            None
        }
    };

    let record = NewBackupRecord {
        volume_name: volume.to_string(),
        service_name,
        project_name: Some(ctx.project_name.clone()),
        file_path: output_path.display().to_string(),
        size_bytes,
        tag: opts.tag.clone(),
        checksum,
    };
    if let Err(e) = ctx.store.append_backup_record(record).await {
        report.warn(
            LifecycleError::persistence("backup", e).to_string(),
        );
    }
    if let Err(e) = ctx.store.touch_last_backup(volume).await {
        report.warn(LifecycleError::persistence("backup", e).to_string());
    }

    prune_generations(ctx, volume, report).await;

    Ok(output_path)
}

fn effective_format(ctx: &ProjectContext, opts: &BackupOptions) -> String {
    if opts.no_compress {
        return "tar".to_string();
    }
    opts.format
        .clone()
        .unwrap_or_else(|| ctx.config.defaults.compress_format.clone())
}

async fn run_archive_mover(
    ctx: &ProjectContext,
    volume: &str,
    output_dir: &Path,
    format: &str,
) -> Result<(), LifecycleError> {
    let bind_dir = output_dir
        .canonicalize()
        .unwrap_or_else(|_| output_dir.to_path_buf());
    let spec = DataMoverSpec::new(
        archive::tar_create_command(format),
        vec![
            MoverMount::volume(volume, "/source", true),
            MoverMount::bind(bind_dir.display().to_string(), "/backup", false),
        ],
    );
    ctx.engine.run_data_mover(spec).await?;
    Ok(())
}

/// Delete ledger rows and files beyond the configured generation count,
/// oldest first. Idempotent: running it again with no new backups removes
/// nothing.
async fn prune_generations(ctx: &ProjectContext, volume: &str, report: &mut WorkflowReport) {
    let keep = ctx.keep_generations() as usize;
    if keep == 0 {
        return;
    }

    let records = match ctx.store.backup_records(Some(volume), 0).await {
        Ok(records) => records,
        Err(e) => {
            report.warn(format!("retention query failed for {volume}: {e}"));
            return;
        }
    };
    if records.len() <= keep {
        return;
    }

    // Records are newest first; everything past `keep` goes, oldest last.
    for record in &records[keep..] {
        if let Err(e) = ctx.store.delete_backup_record(record.id).await {
            report.warn(format!("failed to drop ledger row {}: {e}", record.id));
            continue;
        }
        debug!(volume = %volume, path = %record.file_path, "pruned backup generation");
        if let Err(e) = std::fs::remove_file(&record.file_path) {
            // The row is already gone; a stale ledger beats failing the
            // backup that triggered the prune.
            report.warn(format!(
                "failed to delete backup file {}: {e}",
                record.file_path
            ));
        }
    }
}
