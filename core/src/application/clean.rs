// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Clean workflow: find unused and stale volumes, optionally archive them,
//! delete them.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::application::report::WorkflowReport;
use crate::application::prompt::Prompter;
use crate::domain::engine::{ContainerEngine, DataMoverSpec, MoverMount};
use crate::domain::store::{MetadataStore, NewBackupRecord};
use crate::infrastructure::archive;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Select volumes with no active mount.
    pub unused: bool,
    /// Select volumes whose recorded last access is older than this many
    /// days. Volumes with no recorded access are never stale.
    pub stale_days: Option<u32>,
    pub dry_run: bool,
    /// Archive each candidate before deleting it.
    pub archive: bool,
    pub force: bool,
}

#[derive(Debug, Clone)]
pub struct CleanCandidate {
    pub volume: String,
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Compute cleanup candidates without side effects. Either predicate
/// qualifies a volume; with neither flag set nothing qualifies.
pub async fn plan_clean(
    ctx: &ProjectContext,
    opts: &CleanOptions,
) -> Result<Vec<CleanCandidate>, LifecycleError> {
    let mut candidates = Vec::new();
    if !opts.unused && opts.stale_days.is_none() {
        return Ok(candidates);
    }

    let stale_cutoff = opts
        .stale_days
        .map(|days| Utc::now() - Duration::days(days as i64));

    for volume in ctx.engine.list_volumes().await? {
        let metadata = ctx.store.volume_metadata(&volume.name).await.ok();
        let last_accessed = metadata.and_then(|m| m.last_accessed);

        let mut selected = false;
        if opts.unused && !ctx.engine.volume_in_use(&volume.name).await? {
            selected = true;
        }
        if let (Some(cutoff), Some(accessed)) = (stale_cutoff, last_accessed) {
            if accessed < cutoff {
                selected = true;
            }
        }

        if selected {
            candidates.push(CleanCandidate {
                volume: volume.name,
                last_accessed,
            });
        }
    }

    Ok(candidates)
}

/// Delete (optionally archiving first) the planned candidates. Dry runs
/// return an empty report untouched; each candidate is processed
/// independently of the others' outcomes.
pub async fn execute_clean(
    ctx: &ProjectContext,
    candidates: &[CleanCandidate],
    opts: &CleanOptions,
) -> Result<WorkflowReport, LifecycleError> {
    let mut report = WorkflowReport::new();
    if candidates.is_empty() || opts.dry_run {
        return Ok(report);
    }

    if !opts.force {
        let prompt = format!("Proceed with cleanup of {} volume(s)?", candidates.len());
        if !ctx.prompter.confirm(&prompt) {
            return Err(LifecycleError::Cancelled);
        }
    }

    let archive_dir = ctx.config.paths.archives.join("cleanup");
    if opts.archive {
        archive::ensure_directory(&archive_dir)?;
    }

    for candidate in candidates {
        match clean_one(ctx, &candidate.volume, opts, &mut report).await {
            Ok(()) => report.succeeded(&candidate.volume, "deleted"),
            Err(e) => report.failed(&candidate.volume, e),
        }
    }

    Ok(report)
}

async fn clean_one(
    ctx: &ProjectContext,
    volume: &str,
    opts: &CleanOptions,
    report: &mut WorkflowReport,
) -> Result<(), LifecycleError> {
    if opts.archive {
        let archive_dir = ctx.config.paths.archives.join("cleanup");
        let format = ctx.config.defaults.compress_format.clone();
        let file_name = archive::backup_filename(volume, &format);
        let output_path = archive_dir.join(&file_name);

        info!(volume = %volume, "archiving before cleanup");
        let bind_dir = archive_dir
            .canonicalize()
            .unwrap_or_else(|_| archive_dir.clone());
        let spec = DataMoverSpec::new(
            archive::tar_create_command(&format),
            vec![
                MoverMount::volume(volume, "/source", true),
                MoverMount::bind(bind_dir.display().to_string(), "/backup", false),
            ],
        );
        ctx.engine.run_data_mover(spec).await?;
        archive::move_or_copy(&archive_dir.join(archive::staging_filename(&format)), &output_path)?;

        let record = NewBackupRecord {
            volume_name: volume.to_string(),
            service_name: ctx.service_for_volume(volume),
            project_name: Some(ctx.project_name.clone()),
            file_path: output_path.display().to_string(),
            size_bytes: archive::file_size(&output_path).unwrap_or(0),
            tag: Some("cleanup-archive".to_string()),
            checksum: archive::file_checksum(&output_path).ok(),
        };
        if let Err(e) = ctx.store.append_backup_record(record).await {
            report.warn(LifecycleError::persistence("clean", e).to_string());
        }
    }

    info!(volume = %volume, "deleting volume");
    ctx.engine.remove_volume(volume, false).await?;
    Ok(())
}
