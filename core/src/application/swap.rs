// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Swap workflow: replace a volume's contents end to end.
//!
//! This is the riskiest path in the system: the volume is deleted before
//! its replacement exists. Once containers have been stopped, every
//! destructive step runs under a compensation stack that restarts them on
//! failure; a failed restart is combined with the primary error, never
//! substituted for it.

use crate::application::backup::{backup_volume, BackupOptions};
use crate::application::compensation::{Compensation, CompensationStack};
use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::application::report::WorkflowReport;
use crate::domain::engine::{ContainerEngine, DataMoverSpec, MoverMount, DEFAULT_STOP_TIMEOUT_SECS};
use crate::domain::store::MetadataStore;
use crate::infrastructure::archive;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct SwapOptions {
    /// Leave the fresh volume empty (ignore `source`).
    pub empty: bool,
    /// Skip the safety backup of the current contents.
    pub no_backup: bool,
    /// Restart the stopped containers once the swap completes.
    pub restart: bool,
    pub service: String,
    /// Archive to populate the fresh volume from.
    pub source: Option<PathBuf>,
}

#[derive(Debug)]
pub struct SwapOutcome {
    pub volume: String,
    /// Safety backup of the previous contents, when one was taken.
    pub backup_path: Option<PathBuf>,
    pub warnings: Vec<String>,
}

pub async fn swap(ctx: &ProjectContext, opts: &SwapOptions) -> Result<SwapOutcome, LifecycleError> {
    if opts.service.is_empty() {
        return Err(LifecycleError::ServiceNotFound(String::new()));
    }

    let volume = ctx.resolve_volume(&opts.service).await?;
    if !ctx.engine.volume_exists(&volume).await? {
        return Err(LifecycleError::VolumeNotFound(volume));
    }

    let mut warnings_report = WorkflowReport::new();

    // Safety net first: the old contents survive as an ordinary backup.
    let backup_path = if opts.no_backup {
        None
    } else {
        let backup_dir = ctx.backup_dir();
        archive::ensure_directory(&backup_dir)?;
        let backup_opts = BackupOptions {
            tag: Some("swap-backup".to_string()),
            ..Default::default()
        };
        let path =
            backup_volume(ctx, &volume, &backup_dir, &backup_opts, &mut warnings_report).await?;
        info!(volume = %volume, path = %path.display(), "previous contents backed up");
        Some(path)
    };

    let containers = ctx.engine.containers_using(&volume).await?;
    let mut compensations = CompensationStack::new();

    if !containers.is_empty() {
        info!(volume = %volume, ?containers, "stopping containers for swap");
        ctx.engine
            .stop_containers(&containers, DEFAULT_STOP_TIMEOUT_SECS)
            .await?;
        compensations.push(Compensation::RestartContainers {
            containers: containers.clone(),
            timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
        });
    }

    // From here to the re-create, the service is volumeless on failure;
    // unwind restarts whatever was stopped before surfacing the error.
    if let Err(e) = ctx.engine.remove_volume(&volume, true).await {
        return Err(compensations.fail(ctx.engine.as_ref(), e.into()).await);
    }

    if let Err(e) = ctx.engine.create_volume(&volume).await {
        return Err(compensations.fail(ctx.engine.as_ref(), e.into()).await);
    }

    if let (Some(source), false) = (&opts.source, opts.empty) {
        if let Err(e) = populate_from(ctx, &volume, source).await {
            return Err(compensations.fail(ctx.engine.as_ref(), e).await);
        }
    }

    if opts.restart && !containers.is_empty() {
        if let Err(e) = ctx
            .engine
            .restart_containers(&containers, DEFAULT_STOP_TIMEOUT_SECS)
            .await
        {
            warnings_report.warn(format!("failed to restart some containers: {e}"));
        }
    }
    // The swap itself succeeded; stopped-but-not-restarted containers are
    // what the caller asked for.
    compensations.discard();

    if let Err(e) = ctx.store.touch_last_accessed(&volume).await {
        warnings_report.warn(LifecycleError::persistence("swap", e).to_string());
    }

    Ok(SwapOutcome {
        volume,
        backup_path,
        warnings: warnings_report.warnings,
    })
}

async fn populate_from(
    ctx: &ProjectContext,
    volume: &str,
    source: &Path,
) -> Result<(), LifecycleError> {
    if !source.exists() {
        return Err(LifecycleError::BackupNotFound(source.display().to_string()));
    }
    let bind_dir = source
        .parent()
        .unwrap_or(Path::new("."))
        .canonicalize()
        .unwrap_or_else(|_| source.parent().unwrap_or(Path::new(".")).to_path_buf());
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| LifecycleError::UnrecognizedArchive(source.display().to_string()))?;

    info!(volume = %volume, file = %file_name, "populating fresh volume");
    let spec = DataMoverSpec::new(
        archive::tar_extract_command(&file_name),
        vec![
            MoverMount::volume(volume, "/target", false),
            MoverMount::bind(bind_dir.display().to_string(), "/backup", true),
        ],
    );
    ctx.engine.run_data_mover(spec).await?;
    Ok(())
}
