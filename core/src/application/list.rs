// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! List workflow: enumerate volumes with service mapping and usage state.

use crate::application::context::ProjectContext;
use crate::application::error::LifecycleError;
use crate::domain::engine::ContainerEngine;
use crate::domain::store::MetadataStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Include volumes outside the current project.
    pub all: bool,
    /// Only volumes with no active mount.
    pub unused: bool,
    /// Only volumes not provably accessed within this many days.
    pub stale_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct VolumeListItem {
    pub service: Option<String>,
    pub volume: String,
    pub last_used: Option<DateTime<Utc>>,
    pub in_use: bool,
}

pub async fn list_volumes(
    ctx: &ProjectContext,
    opts: &ListOptions,
) -> Result<Vec<VolumeListItem>, LifecycleError> {
    let project_prefix = if !opts.all && ctx.descriptor.is_some() && !ctx.project_name.is_empty() {
        Some(format!("{}_", ctx.project_name))
    } else {
        None
    };
    let stale_cutoff = opts
        .stale_days
        .map(|days| Utc::now() - Duration::days(days as i64));

    let mut items = Vec::new();
    for volume in ctx.engine.list_volumes().await? {
        if let Some(prefix) = &project_prefix {
            if !volume.name.starts_with(prefix) {
                continue;
            }
        }

        let in_use = ctx.engine.volume_in_use(&volume.name).await?;
        if opts.unused && in_use {
            continue;
        }

        let last_used = ctx
            .store
            .volume_metadata(&volume.name)
            .await
            .ok()
            .and_then(|m| m.last_accessed);

        // The stale filter only excludes volumes known to be recent; an
        // untracked volume stays listed.
        if let (Some(cutoff), Some(accessed)) = (stale_cutoff, last_used) {
            if accessed >= cutoff {
                continue;
            }
        }

        items.push(VolumeListItem {
            service: ctx.service_for_volume(&volume.name),
            volume: volume.name,
            last_used,
            in_use,
        });
    }

    items.sort_by(|a, b| a.volume.cmp(&b.volume));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    const DB_SERVICE: &str = "\
services:
  db:
    image: postgres
    volumes:
      - data:/var/lib/postgresql/data
";

    #[tokio::test]
    async fn test_list_filters_to_project_prefix() {
        let harness = TestHarness::new();
        harness.engine.create_volume("p_data").await.unwrap();
        harness.engine.create_volume("other_data").await.unwrap();
        let ctx = harness.context("p", Some(DB_SERVICE));

        let items = list_volumes(&ctx, &ListOptions::default()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].volume, "p_data");
        assert_eq!(items[0].service.as_deref(), Some("db"));

        let all = list_volumes(&ctx, &ListOptions { all: true, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        // The foreign volume is unmanaged, not an error.
        assert!(all.iter().any(|i| i.volume == "other_data" && i.service.is_none()));
    }

    #[tokio::test]
    async fn test_list_unused_filter() {
        let harness = TestHarness::new();
        harness.engine.create_volume("p_data").await.unwrap();
        harness.engine.create_volume("p_idle").await.unwrap();
        harness.engine.add_user("p_data", "db-1");
        let ctx = harness.context("p", Some(DB_SERVICE));

        let items = list_volumes(&ctx, &ListOptions { unused: true, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].volume, "p_idle");
    }
}
