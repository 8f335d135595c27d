// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Restore workflow.
//!
//! The on-disk archive name encodes the physical volume name while callers
//! think in service names, so backup lookup spans every alias the target is
//! known under.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::application::prompt::Prompter;
use crate::application::report::WorkflowReport;
use crate::domain::engine::{ContainerEngine, DataMoverSpec, MoverMount, DEFAULT_STOP_TIMEOUT_SECS};
use crate::domain::store::MetadataStore;
use crate::infrastructure::archive;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Choose the backup interactively instead of newest-wins.
    pub select: bool,
    pub force: bool,
    /// Restart containers using the volume afterwards.
    pub restart: bool,
    /// Service alias, volume name, or archive file path. `None` restores
    /// every project volume.
    pub target: Option<String>,
}

/// Run the restore workflow.
///
/// A single explicit target propagates its failure unchanged; restoring the
/// whole project isolates per-volume failures into the report.
pub async fn restore(
    ctx: &ProjectContext,
    opts: &RestoreOptions,
) -> Result<WorkflowReport, LifecycleError> {
    let mut report = WorkflowReport::new();

    match &opts.target {
        None => {
            let volumes = ctx.project_volumes()?;
            if volumes.is_empty() {
                report.warn("no volumes found in project");
                return Ok(report);
            }
            for volume in volumes {
                let alias = ctx
                    .service_for_volume(&volume)
                    .unwrap_or_else(|| volume.clone());
                match restore_alias(ctx, &alias, opts, &mut report).await {
                    Ok(volume) => report.succeeded(&volume, "restored"),
                    Err(e) => report.failed(&volume, e),
                }
            }
            Ok(report)
        }
        Some(target) if Path::new(target).exists() => {
            let volume = restore_from_file(ctx, Path::new(target), None, opts, &mut report).await?;
            report.succeeded(&volume, format!("restored from {target}"));
            Ok(report)
        }
        Some(target) => {
            let volume = restore_alias(ctx, target, opts, &mut report).await?;
            report.succeeded(&volume, "restored");
            Ok(report)
        }
    }
}

/// Backup files that restore would consider for a target, newest last.
pub async fn restore_candidates(
    ctx: &ProjectContext,
    target: &str,
) -> Result<Vec<PathBuf>, LifecycleError> {
    let volume = match ctx.resolve_volume(target).await {
        Ok(volume) => volume,
        Err(_) => target.to_string(),
    };
    let names = ctx.search_names(target, &volume);
    Ok(archive::list_backup_files(&ctx.backup_dir(), &names))
}

async fn restore_alias(
    ctx: &ProjectContext,
    alias: &str,
    opts: &RestoreOptions,
    report: &mut WorkflowReport,
) -> Result<String, LifecycleError> {
    // The alias may name a volume that does not exist yet; restoring then
    // creates it under the resolved name.
    let volume = match ctx.resolve_volume(alias).await {
        Ok(volume) => volume,
        Err(_) => alias.to_string(),
    };

    let names = ctx.search_names(alias, &volume);
    let backup_dir = ctx.backup_dir();

    let backup_file = if opts.select {
        let files = archive::list_backup_files(&backup_dir, &names);
        if files.is_empty() {
            return Err(LifecycleError::BackupNotFound(alias.to_string()));
        }
        let items: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap_or_default().to_string_lossy().into_owned())
            .collect();
        let picked = ctx
            .prompter
            .select(&format!("Select backup for {alias}"), &items)
            .ok_or(LifecycleError::Cancelled)?;
        files
            .get(picked)
            .cloned()
            .ok_or(LifecycleError::Cancelled)?
    } else {
        archive::find_latest_backup(&backup_dir, &names)
            .ok_or_else(|| LifecycleError::BackupNotFound(alias.to_string()))?
    };

    restore_from_file(ctx, &backup_file, Some(volume), opts, report).await
}

/// Restore a volume from a specific archive file. Returns the volume name.
async fn restore_from_file(
    ctx: &ProjectContext,
    backup_file: &Path,
    volume: Option<String>,
    opts: &RestoreOptions,
    report: &mut WorkflowReport,
) -> Result<String, LifecycleError> {
    let volume = match volume {
        Some(volume) => volume,
        None => infer_volume(ctx, backup_file).await?,
    };

    // Overwriting a live or existing volume is gated: this is the last
    // stop before unrecoverable data loss.
    if ctx.engine.volume_exists(&volume).await? {
        if !opts.force {
            if ctx.engine.volume_in_use(&volume).await? {
                let containers = ctx.engine.containers_using(&volume).await?;
                let prompt =
                    format!("Volume {volume} is in use by {containers:?}. Continue?");
                if !ctx.prompter.confirm(&prompt) {
                    return Err(LifecycleError::Cancelled);
                }
            }
            let prompt = format!("This will overwrite {volume}. Continue?");
            if !ctx.prompter.confirm(&prompt) {
                return Err(LifecycleError::Cancelled);
            }
        }
    } else {
        ctx.engine.create_volume(&volume).await?;
    }

    info!(volume = %volume, file = %backup_file.display(), "restoring volume");

    let bind_dir = backup_file
        .parent()
        .unwrap_or(Path::new("."))
        .canonicalize()
        .unwrap_or_else(|_| backup_file.parent().unwrap_or(Path::new(".")).to_path_buf());
    let file_name = backup_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LifecycleError::UnrecognizedArchive(backup_file.display().to_string()))?;

    let spec = DataMoverSpec::new(
        archive::tar_extract_command(&file_name),
        vec![
            MoverMount::volume(volume.clone(), "/target", false),
            MoverMount::bind(bind_dir.display().to_string(), "/backup", true),
        ],
    );
    ctx.engine.run_data_mover(spec).await?;

    if let Err(e) = ctx.store.touch_last_accessed(&volume).await {
        report.warn(LifecycleError::persistence("restore", e).to_string());
    }

    if opts.restart {
        let containers = ctx.engine.containers_using(&volume).await?;
        if !containers.is_empty() {
            if let Err(e) = ctx
                .engine
                .restart_containers(&containers, DEFAULT_STOP_TIMEOUT_SECS)
                .await
            {
                warn!(volume = %volume, "restart after restore failed");
                report.warn(format!("failed to restart containers for {volume}: {e}"));
            }
        }
    }

    Ok(volume)
}

/// Recover the target volume from an archive filename alone.
async fn infer_volume(
    ctx: &ProjectContext,
    backup_file: &Path,
) -> Result<String, LifecycleError> {
    let encoded = archive::volume_name_from_filename(backup_file)
        .ok_or_else(|| LifecycleError::UnrecognizedArchive(backup_file.display().to_string()))?;

    match ctx.resolve_volume(&encoded).await {
        Ok(volume) => Ok(volume),
        Err(_) if !ctx.project_name.is_empty() && !encoded.starts_with(&format!("{}_", ctx.project_name)) => {
            Ok(format!("{}_{}", ctx.project_name, encoded))
        }
        Err(_) => Ok(encoded),
    }
}
