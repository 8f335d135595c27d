// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Metadata store contract: access/backup timestamp tracking and the
//! append-only backup ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// One row of the backup ledger. Append-only; rows are mutated only by
/// retention deletion.
#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    pub id: i64,
    pub volume_name: String,
    pub service_name: Option<String>,
    pub project_name: Option<String>,
    pub file_path: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub tag: Option<String>,
    pub checksum: Option<String>,
}

/// A ledger row about to be appended; the store assigns `id`/`created_at`.
#[derive(Debug, Clone)]
pub struct NewBackupRecord {
    pub volume_name: String,
    pub service_name: Option<String>,
    pub project_name: Option<String>,
    pub file_path: String,
    pub size_bytes: i64,
    pub tag: Option<String>,
    pub checksum: Option<String>,
}

/// Per-volume bookkeeping. One row per physical volume name, upserted on
/// every access-worthy operation and never deleted when the volume goes
/// away; history outlives the volume.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeMetadata {
    pub volume_name: String,
    pub last_accessed: Option<DateTime<Utc>>,
    pub last_backup: Option<DateTime<Utc>>,
    pub backup_count: i64,
}

impl VolumeMetadata {
    /// A metadata row for a volume the store has never seen.
    pub fn empty(volume_name: impl Into<String>) -> Self {
        Self {
            volume_name: volume_name.into(),
            last_accessed: None,
            last_backup: None,
            backup_count: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),

    #[error("metadata query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Record an access-worthy operation on the volume.
    async fn touch_last_accessed(&self, volume: &str) -> Result<(), StoreError>;

    /// Record a completed backup; also increments the backup count.
    async fn touch_last_backup(&self, volume: &str) -> Result<(), StoreError>;

    /// Metadata for one volume; an untracked volume yields an empty row.
    async fn volume_metadata(&self, volume: &str) -> Result<VolumeMetadata, StoreError>;

    /// Append a ledger row, returning its assigned id.
    async fn append_backup_record(&self, record: NewBackupRecord) -> Result<i64, StoreError>;

    /// Ledger rows, newest first. `volume: None` spans every volume;
    /// `limit: 0` means unbounded.
    async fn backup_records(
        &self,
        volume: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BackupRecord>, StoreError>;

    async fn delete_backup_record(&self, id: i64) -> Result<(), StoreError>;

    /// Volumes whose recorded last access is older than the cutoff.
    async fn stale_volumes(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StoreError>;
}
