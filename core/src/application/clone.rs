// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Clone workflow: duplicate a volume's contents under a new name.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::application::prompt::Prompter;
use crate::domain::engine::{ContainerEngine, DataMoverSpec, MoverMount};
use crate::domain::store::MetadataStore;
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    pub service: String,
    pub new_name: String,
}

#[derive(Debug)]
pub struct CloneOutcome {
    pub source: String,
    pub target: String,
    pub warnings: Vec<String>,
}

static VOLUME_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").expect("volume-name pattern is valid")
});

/// Validate a volume name the engine would accept.
pub fn validate_volume_name(name: &str) -> Result<(), LifecycleError> {
    if name.is_empty()
        || name.len() > 255
        || name == "."
        || name == ".."
        || name.contains("..")
        || !VOLUME_NAME.is_match(name)
    {
        return Err(LifecycleError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub async fn clone_volume(
    ctx: &ProjectContext,
    opts: &CloneOptions,
) -> Result<CloneOutcome, LifecycleError> {
    if opts.service.is_empty() {
        return Err(LifecycleError::ServiceNotFound(String::new()));
    }
    validate_volume_name(&opts.new_name)?;

    let source = ctx.resolve_volume(&opts.service).await?;

    let mut target = opts.new_name.clone();
    if !ctx.project_name.is_empty() {
        let prefix = format!("{}_", ctx.project_name);
        if !target.starts_with(&prefix) {
            target = format!("{prefix}{target}");
        }
    }

    if ctx.engine.volume_exists(&target).await? {
        let prompt = format!("Volume {target} already exists. Overwrite?");
        if !ctx.prompter.confirm(&prompt) {
            return Err(LifecycleError::Conflict(target));
        }
        ctx.engine.remove_volume(&target, true).await?;
    }

    ctx.engine.create_volume(&target).await?;

    info!(source = %source, target = %target, "cloning volume");
    let spec = DataMoverSpec::new(
        vec![
            "sh".to_string(),
            "-c".to_string(),
            "cp -a /source/. /target/".to_string(),
        ],
        vec![
            MoverMount::volume(source.clone(), "/source", true),
            MoverMount::volume(target.clone(), "/target", false),
        ],
    );
    ctx.engine.run_data_mover(spec).await?;

    let mut warnings = Vec::new();
    if let Err(e) = ctx.store.touch_last_accessed(&target).await {
        warnings.push(LifecycleError::persistence("clone", e).to_string());
    }

    Ok(CloneOutcome { source, target, warnings })
}
