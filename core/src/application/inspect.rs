// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Inspect workflow: one volume's engine state and recorded metadata.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::domain::engine::{ContainerEngine, VolumeSummary};
use crate::domain::store::{MetadataStore, VolumeMetadata};
use serde::Serialize;

/// Everything known about one volume, typed for presentation.
#[derive(Debug, Serialize)]
pub struct VolumeReport {
    #[serde(flatten)]
    pub volume: VolumeSummary,
    pub in_use: bool,
    pub containers: Vec<String>,
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<VolumeMetadata>,
}

pub async fn inspect(ctx: &ProjectContext, target: &str) -> Result<VolumeReport, LifecycleError> {
    if target.is_empty() {
        return Err(LifecycleError::ServiceNotFound(String::new()));
    }

    let volume_name = ctx.resolve_volume(target).await?;
    let volume = ctx.engine.inspect_volume(&volume_name).await?;
    let in_use = ctx.engine.volume_in_use(&volume_name).await?;
    let containers = ctx.engine.containers_using(&volume_name).await?;
    let service = ctx.service_for_volume(&volume_name);
    // Missing metadata is not an inspection failure.
    let metadata = ctx.store.volume_metadata(&volume_name).await.ok();

    Ok(VolumeReport {
        volume,
        in_use,
        containers,
        service,
        metadata,
    })
}
