// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Container engine contract.
//!
//! The engine owns volume CRUD, in-use detection, container stop/restart and
//! the ephemeral data-mover. One primitive, `run_data_mover`, drives backup,
//! restore and clone alike by varying the mount roles and the archive
//! command.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Image used for data-mover containers.
pub const DATA_MOVER_IMAGE: &str = "alpine:latest";

/// Seconds granted to a container to stop gracefully. Applies only to the
/// stop/restart calls, never to data-mover runs.
pub const DEFAULT_STOP_TIMEOUT_SECS: i64 = 10;

/// Engine-side view of a volume.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeSummary {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// One mount of a data-mover container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoverMount {
    /// True for a volume mount, false for a host bind mount.
    pub volume: bool,
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

impl MoverMount {
    pub fn volume(source: impl Into<String>, target: impl Into<String>, read_only: bool) -> Self {
        Self { volume: true, source: source.into(), target: target.into(), read_only }
    }

    pub fn bind(source: impl Into<String>, target: impl Into<String>, read_only: bool) -> Self {
        Self { volume: false, source: source.into(), target: target.into(), read_only }
    }
}

/// An ephemeral container run bridging volume mounts and host mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMoverSpec {
    pub image: String,
    pub command: Vec<String>,
    pub mounts: Vec<MoverMount>,
}

impl DataMoverSpec {
    pub fn new(command: Vec<String>, mounts: Vec<MoverMount>) -> Self {
        Self { image: DATA_MOVER_IMAGE.to_string(), command, mounts }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to connect to container engine: {0}")]
    Connection(String),

    #[error("volume {0} not found")]
    VolumeNotFound(String),

    #[error("data mover exited with status {status}: {logs}")]
    NonZeroExit { status: i64, logs: String },

    #[error("container engine request failed: {0}")]
    Api(String),
}

/// Contract consumed from the container engine.
///
/// Every call is blocking from the workflow's point of view; timeouts are
/// whatever the engine enforces on that specific step.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn list_volumes(&self) -> Result<Vec<VolumeSummary>, EngineError>;

    async fn volume_exists(&self, name: &str) -> Result<bool, EngineError>;

    async fn inspect_volume(&self, name: &str) -> Result<VolumeSummary, EngineError>;

    async fn create_volume(&self, name: &str) -> Result<(), EngineError>;

    async fn remove_volume(&self, name: &str, force: bool) -> Result<(), EngineError>;

    /// Whether any container (running or not) mounts the volume.
    async fn volume_in_use(&self, name: &str) -> Result<bool, EngineError>;

    /// Names of containers mounting the volume, without the leading slash.
    async fn containers_using(&self, name: &str) -> Result<Vec<String>, EngineError>;

    async fn stop_containers(&self, names: &[String], timeout_secs: i64)
        -> Result<(), EngineError>;

    async fn restart_containers(&self, names: &[String], timeout_secs: i64)
        -> Result<(), EngineError>;

    /// Run the data-mover to completion. Non-zero exit surfaces as
    /// [`EngineError::NonZeroExit`] with the captured container logs.
    async fn run_data_mover(&self, spec: DataMoverSpec) -> Result<(), EngineError>;

    async fn pull_image(&self, reference: &str) -> Result<(), EngineError>;
}
