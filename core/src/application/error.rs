// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow failure kinds.

use crate::domain::engine::EngineError;
use crate::domain::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("volume {0} not found")]
    VolumeNotFound(String),

    #[error("service {0} not found")]
    ServiceNotFound(String),

    #[error("no backup found for {0}")]
    BackupNotFound(String),

    #[error("project definition not found")]
    DefinitionNotFound,

    #[error(transparent)]
    Definition(#[from] crate::infrastructure::compose::DefinitionError),

    #[error("volume {volume} is in use by {containers:?}")]
    InUse {
        volume: String,
        containers: Vec<String>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("volume {0} already exists")]
    Conflict(String),

    #[error("volume name {0:?} is not valid")]
    InvalidName(String),

    #[error("archive {0} does not encode a volume name; specify the target explicitly")]
    UnrecognizedArchive(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The physical operation succeeded; only bookkeeping is stale.
    #[error("{operation} completed but metadata update failed: {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("filesystem operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// A destructive step failed and the attempted rollback failed too. The
    /// primary error is the one that matters; the rollback outcome rides
    /// along.
    #[error("{primary} (rollback also failed: {rollback})")]
    Compensated {
        primary: Box<LifecycleError>,
        rollback: String,
    },
}

impl LifecycleError {
    /// The error to report when metadata writes fail after a successful data
    /// operation: distinct, and downgraded to a warning by callers.
    pub fn persistence(operation: &'static str, source: StoreError) -> Self {
        Self::Persistence { operation, source }
    }
}
