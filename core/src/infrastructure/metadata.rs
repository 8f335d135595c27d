// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SQLite implementation of the [`MetadataStore`] contract.
//!
//! One store instance per installation. The pool is capped at a single
//! connection: SQLite serializes writers internally, and readers share the
//! writer's connection by design.

use crate::domain::store::{
    BackupRecord, MetadataStore, NewBackupRecord, StoreError, VolumeMetadata,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS volume_metadata (
    volume_name   TEXT PRIMARY KEY,
    last_accessed TIMESTAMP,
    last_backup   TIMESTAMP,
    backup_count  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS backup_records (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    volume_name  TEXT NOT NULL,
    service_name TEXT,
    project_name TEXT,
    file_path    TEXT NOT NULL,
    size_bytes   INTEGER NOT NULL DEFAULT 0,
    created_at   TIMESTAMP NOT NULL,
    tag          TEXT,
    checksum     TEXT
);

CREATE INDEX IF NOT EXISTS idx_backup_volume ON backup_records(volume_name);
CREATE INDEX IF NOT EXISTS idx_backup_project ON backup_records(project_name);
CREATE INDEX IF NOT EXISTS idx_backup_created ON backup_records(created_at);
"#;

#[derive(Clone)]
pub struct SqliteMetadataStore {
    pool: SqlitePool,
}

impl SqliteMetadataStore {
    /// Open (creating if missing) the store at the given path.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if db_path != Path::new(":memory:") {
            if let Some(parent) = db_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }

        let path_str = db_path
            .to_str()
            .ok_or_else(|| StoreError::Unavailable("invalid database path".to_string()))?;

        let options = SqliteConnectOptions::from_str(path_str)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("schema init failed: {e}")))?;

        info!(path = %db_path.display(), "metadata store ready");
        Ok(Self { pool })
    }

    /// In-memory store for tests.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(":memory:").await
    }

    fn record_from_row(row: sqlx::sqlite::SqliteRow) -> Result<BackupRecord, StoreError> {
        let get = |e: sqlx::Error| StoreError::Query(e.to_string());
        Ok(BackupRecord {
            id: row.try_get("id").map_err(get)?,
            volume_name: row.try_get("volume_name").map_err(get)?,
            service_name: row.try_get("service_name").map_err(get)?,
            project_name: row.try_get("project_name").map_err(get)?,
            file_path: row.try_get("file_path").map_err(get)?,
            size_bytes: row.try_get("size_bytes").map_err(get)?,
            created_at: row.try_get("created_at").map_err(get)?,
            tag: row.try_get("tag").map_err(get)?,
            checksum: row.try_get("checksum").map_err(get)?,
        })
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn touch_last_accessed(&self, volume: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO volume_metadata (volume_name, last_accessed, backup_count)
            VALUES (?, ?, 0)
            ON CONFLICT(volume_name) DO UPDATE SET last_accessed = excluded.last_accessed
            "#,
        )
        .bind(volume)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn touch_last_backup(&self, volume: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO volume_metadata (volume_name, last_backup, backup_count)
            VALUES (?, ?, 1)
            ON CONFLICT(volume_name) DO UPDATE SET
                last_backup = excluded.last_backup,
                backup_count = backup_count + 1
            "#,
        )
        .bind(volume)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn volume_metadata(&self, volume: &str) -> Result<VolumeMetadata, StoreError> {
        let row = sqlx::query(
            "SELECT volume_name, last_accessed, last_backup, backup_count \
             FROM volume_metadata WHERE volume_name = ?",
        )
        .bind(volume)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(VolumeMetadata::empty(volume));
        };
        let get = |e: sqlx::Error| StoreError::Query(e.to_string());
        Ok(VolumeMetadata {
            volume_name: row.try_get("volume_name").map_err(get)?,
            last_accessed: row.try_get("last_accessed").map_err(get)?,
            last_backup: row.try_get("last_backup").map_err(get)?,
            backup_count: row.try_get("backup_count").map_err(get)?,
        })
    }

    async fn append_backup_record(&self, record: NewBackupRecord) -> Result<i64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO backup_records
                (volume_name, service_name, project_name, file_path, size_bytes, created_at, tag, checksum)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.volume_name)
        .bind(&record.service_name)
        .bind(&record.project_name)
        .bind(&record.file_path)
        .bind(record.size_bytes)
        .bind(Utc::now())
        .bind(&record.tag)
        .bind(&record.checksum)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn backup_records(
        &self,
        volume: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BackupRecord>, StoreError> {
        let mut sql = String::from(
            "SELECT id, volume_name, service_name, project_name, file_path, \
             size_bytes, created_at, tag, checksum FROM backup_records",
        );
        if volume.is_some() {
            sql.push_str(" WHERE volume_name = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        if limit > 0 {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query(&sql);
        if let Some(volume) = volume {
            query = query.bind(volume);
        }
        if limit > 0 {
            query = query.bind(limit);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.into_iter().map(Self::record_from_row).collect()
    }

    async fn delete_backup_record(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM backup_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    async fn stale_volumes(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT volume_name FROM volume_metadata \
             WHERE last_accessed IS NOT NULL AND last_accessed < ?",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.into_iter()
            .map(|row| row.try_get("volume_name").map_err(|e| StoreError::Query(e.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(volume: &str, path: &str) -> NewBackupRecord {
        NewBackupRecord {
            volume_name: volume.to_string(),
            service_name: Some("db".to_string()),
            project_name: Some("p".to_string()),
            file_path: path.to_string(),
            size_bytes: 42,
            tag: None,
            checksum: Some("ab".repeat(32)),
        }
    }

    #[tokio::test]
    async fn test_metadata_upsert_and_backup_count() {
        let store = SqliteMetadataStore::open_in_memory().await.unwrap();

        let empty = store.volume_metadata("p_data").await.unwrap();
        assert_eq!(empty.backup_count, 0);
        assert!(empty.last_accessed.is_none());

        store.touch_last_backup("p_data").await.unwrap();
        store.touch_last_backup("p_data").await.unwrap();
        store.touch_last_accessed("p_data").await.unwrap();

        let meta = store.volume_metadata("p_data").await.unwrap();
        assert_eq!(meta.backup_count, 2);
        assert!(meta.last_backup.is_some());
        assert!(meta.last_accessed.is_some());
    }

    #[tokio::test]
    async fn test_ledger_append_list_delete() {
        let store = SqliteMetadataStore::open_in_memory().await.unwrap();

        let first = store.append_backup_record(record("p_data", "/b/1.tar.gz")).await.unwrap();
        let second = store.append_backup_record(record("p_data", "/b/2.tar.gz")).await.unwrap();
        store.append_backup_record(record("p_other", "/b/3.tar.gz")).await.unwrap();
        assert!(second > first);

        let records = store.backup_records(Some("p_data"), 0).await.unwrap();
        assert_eq!(records.len(), 2);
        // Newest first.
        assert_eq!(records[0].file_path, "/b/2.tar.gz");

        let limited = store.backup_records(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        store.delete_backup_record(first).await.unwrap();
        let records = store.backup_records(Some("p_data"), 0).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, second);
    }

    #[tokio::test]
    async fn test_stale_volumes_cutoff() {
        let store = SqliteMetadataStore::open_in_memory().await.unwrap();
        store.touch_last_accessed("p_old").await.unwrap();

        // Accessed just now: not stale for a cutoff in the past.
        let past_cutoff = Utc::now() - Duration::days(30);
        assert!(store.stale_volumes(past_cutoff).await.unwrap().is_empty());

        // A cutoff in the future makes it stale; never-accessed volumes
        // stay out either way.
        let future_cutoff = Utc::now() + Duration::seconds(5);
        let stale = store.stale_volumes(future_cutoff).await.unwrap();
        assert_eq!(stale, vec!["p_old".to_string()]);
    }
}
