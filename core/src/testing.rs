// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared test doubles for the engine, store and prompter contracts.

use crate::application::context::ProjectContext;
use crate::application::prompt::Prompter;
use crate::config::Config;
use crate::domain::engine::{
    ContainerEngine, DataMoverSpec, EngineError, VolumeSummary,
};
use crate::domain::project::ProjectDescriptor;
use crate::domain::store::{
    BackupRecord, MetadataStore, NewBackupRecord, StoreError, VolumeMetadata,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory engine. Volumes are names; the data mover materializes staging
/// files into bind mounts so workflows exercising the filesystem layer see
/// real files.
#[derive(Default)]
pub struct MockEngine {
    pub volumes: Mutex<BTreeSet<String>>,
    /// volume name -> containers mounting it
    pub users: Mutex<BTreeMap<String, Vec<String>>>,
    pub stopped: Mutex<Vec<String>>,
    pub restarted: Mutex<Vec<String>>,
    pub mover_runs: Mutex<Vec<DataMoverSpec>>,
    pub removed: Mutex<Vec<String>>,
    /// Volume name whose creation must fail, for compensation tests.
    pub fail_create: Mutex<Option<String>>,
    /// When set, every restart attempt fails.
    pub fail_restart: Mutex<bool>,
    /// When set, data-mover runs exit non-zero.
    pub fail_mover: Mutex<bool>,
    mover_counter: AtomicI64,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volumes(names: &[&str]) -> Self {
        let engine = Self::default();
        {
            let mut volumes = engine.volumes.lock().unwrap();
            for name in names {
                volumes.insert(name.to_string());
            }
        }
        engine
    }

    pub fn add_user(&self, volume: &str, container: &str) {
        self.users
            .lock()
            .unwrap()
            .entry(volume.to_string())
            .or_default()
            .push(container.to_string());
    }
}

#[async_trait]
impl ContainerEngine for MockEngine {
    async fn list_volumes(&self) -> Result<Vec<VolumeSummary>, EngineError> {
        Ok(self
            .volumes
            .lock()
            .unwrap()
            .iter()
            .map(|name| VolumeSummary {
                name: name.clone(),
                driver: "local".to_string(),
                mountpoint: format!("/var/lib/docker/volumes/{name}/_data"),
                created_at: Some(Utc::now()),
            })
            .collect())
    }

    async fn volume_exists(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self.volumes.lock().unwrap().contains(name))
    }

    async fn inspect_volume(&self, name: &str) -> Result<VolumeSummary, EngineError> {
        if !self.volumes.lock().unwrap().contains(name) {
            return Err(EngineError::VolumeNotFound(name.to_string()));
        }
        Ok(VolumeSummary {
            name: name.to_string(),
            driver: "local".to_string(),
            mountpoint: format!("/var/lib/docker/volumes/{name}/_data"),
            created_at: Some(Utc::now()),
        })
    }

    async fn create_volume(&self, name: &str) -> Result<(), EngineError> {
        if self.fail_create.lock().unwrap().as_deref() == Some(name) {
            return Err(EngineError::Api(format!("cannot create volume {name}")));
        }
        self.volumes.lock().unwrap().insert(name.to_string());
        Ok(())
    }

    async fn remove_volume(&self, name: &str, _force: bool) -> Result<(), EngineError> {
        if !self.volumes.lock().unwrap().remove(name) {
            return Err(EngineError::VolumeNotFound(name.to_string()));
        }
        self.removed.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn volume_in_use(&self, name: &str) -> Result<bool, EngineError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(name)
            .is_some_and(|c| !c.is_empty()))
    }

    async fn containers_using(&self, name: &str) -> Result<Vec<String>, EngineError> {
        Ok(self.users.lock().unwrap().get(name).cloned().unwrap_or_default())
    }

    async fn stop_containers(
        &self,
        names: &[String],
        _timeout_secs: i64,
    ) -> Result<(), EngineError> {
        self.stopped.lock().unwrap().extend(names.iter().cloned());
        Ok(())
    }

    async fn restart_containers(
        &self,
        names: &[String],
        _timeout_secs: i64,
    ) -> Result<(), EngineError> {
        if *self.fail_restart.lock().unwrap() {
            return Err(EngineError::Api("restart refused".to_string()));
        }
        self.restarted.lock().unwrap().extend(names.iter().cloned());
        Ok(())
    }

    async fn run_data_mover(&self, spec: DataMoverSpec) -> Result<(), EngineError> {
        self.mover_runs.lock().unwrap().push(spec.clone());
        if *self.fail_mover.lock().unwrap() {
            return Err(EngineError::NonZeroExit {
                status: 2,
                logs: "tar: simulated failure".to_string(),
            });
        }
        // A tar-create run writes its staging file into the bind mount.
        if let Some(out) = spec
            .command
            .iter()
            .find(|arg| arg.starts_with("/backup/data."))
        {
            if let Some(bind) = spec.mounts.iter().find(|m| !m.volume) {
                let file_name = out.trim_start_matches("/backup/");
                let n = self.mover_counter.fetch_add(1, Ordering::SeqCst);
                let source = spec
                    .mounts
                    .iter()
                    .find(|m| m.volume)
                    .map(|m| m.source.clone())
                    .unwrap_or_default();
                std::fs::write(
                    Path::new(&bind.source).join(file_name),
                    format!("archive of {source} #{n}"),
                )
                .map_err(|e| EngineError::Api(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn pull_image(&self, _reference: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

/// In-memory metadata store.
#[derive(Default)]
pub struct MockStore {
    pub records: Mutex<Vec<BackupRecord>>,
    pub metadata: Mutex<BTreeMap<String, VolumeMetadata>>,
    /// When set, every write fails, for persistence-warning tests.
    pub fail_writes: Mutex<bool>,
    next_id: AtomicI64,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if *self.fail_writes.lock().unwrap() {
            Err(StoreError::Query("store is read-only".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MetadataStore for MockStore {
    async fn touch_last_accessed(&self, volume: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut metadata = self.metadata.lock().unwrap();
        let entry = metadata
            .entry(volume.to_string())
            .or_insert_with(|| VolumeMetadata::empty(volume));
        entry.last_accessed = Some(Utc::now());
        Ok(())
    }

    async fn touch_last_backup(&self, volume: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut metadata = self.metadata.lock().unwrap();
        let entry = metadata
            .entry(volume.to_string())
            .or_insert_with(|| VolumeMetadata::empty(volume));
        entry.last_backup = Some(Utc::now());
        entry.backup_count += 1;
        Ok(())
    }

    async fn volume_metadata(&self, volume: &str) -> Result<VolumeMetadata, StoreError> {
        Ok(self
            .metadata
            .lock()
            .unwrap()
            .get(volume)
            .cloned()
            .unwrap_or_else(|| VolumeMetadata::empty(volume)))
    }

    async fn append_backup_record(&self, record: NewBackupRecord) -> Result<i64, StoreError> {
        self.check_writable()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(BackupRecord {
            id,
            volume_name: record.volume_name,
            service_name: record.service_name,
            project_name: record.project_name,
            file_path: record.file_path,
            size_bytes: record.size_bytes,
            created_at: Utc::now(),
            tag: record.tag,
            checksum: record.checksum,
        });
        Ok(id)
    }

    async fn backup_records(
        &self,
        volume: Option<&str>,
        limit: i64,
    ) -> Result<Vec<BackupRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        let mut selected: Vec<BackupRecord> = records
            .iter()
            .filter(|r| volume.is_none_or(|v| r.volume_name == v))
            .cloned()
            .collect();
        // Newest first; ids are monotonic.
        selected.sort_by(|a, b| b.id.cmp(&a.id));
        if limit > 0 {
            selected.truncate(limit as usize);
        }
        Ok(selected)
    }

    async fn delete_backup_record(&self, id: i64) -> Result<(), StoreError> {
        self.check_writable()?;
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn stale_volumes(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StoreError> {
        Ok(self
            .metadata
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.last_accessed.is_some_and(|t| t < cutoff))
            .map(|m| m.volume_name.clone())
            .collect())
    }
}

/// Prompter with a scripted answer queue; an exhausted queue falls back to
/// the default answer.
pub struct ScriptedPrompter {
    pub confirms: Mutex<VecDeque<bool>>,
    pub selections: Mutex<VecDeque<Option<usize>>>,
    pub default_confirm: bool,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn accepting() -> Self {
        Self {
            confirms: Mutex::new(VecDeque::new()),
            selections: Mutex::new(VecDeque::new()),
            default_confirm: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            default_confirm: false,
            ..Self::accepting()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str) -> bool {
        self.asked.lock().unwrap().push(prompt.to_string());
        self.confirms
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_confirm)
    }

    fn select(&self, prompt: &str, _items: &[String]) -> Option<usize> {
        self.asked.lock().unwrap().push(prompt.to_string());
        self.selections.lock().unwrap().pop_front().unwrap_or(Some(0))
    }
}

/// Context wired to mocks, with backup/archive paths under a temp root.
pub struct TestHarness {
    pub engine: Arc<MockEngine>,
    pub store: Arc<MockStore>,
    pub prompter: Arc<ScriptedPrompter>,
    pub root: tempfile::TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_prompter(ScriptedPrompter::accepting())
    }

    pub fn with_prompter(prompter: ScriptedPrompter) -> Self {
        Self {
            engine: Arc::new(MockEngine::new()),
            store: Arc::new(MockStore::new()),
            prompter: Arc::new(prompter),
            root: tempfile::tempdir().expect("temp dir"),
        }
    }

    /// Build a context over the mocks; `definition` is decoded YAML text.
    pub fn context(&self, project_name: &str, definition: Option<&str>) -> ProjectContext {
        let mut config = Config::default();
        config.paths.backups = self.root.path().join("backups");
        config.paths.archives = self.root.path().join("archives");

        let descriptor = definition.map(|text| self.write_definition(text));

        ProjectContext {
            engine: self.engine.clone(),
            store: self.store.clone(),
            prompter: self.prompter.clone(),
            config,
            descriptor,
            project_name: project_name.to_string(),
        }
    }

    fn write_definition(&self, text: &str) -> ProjectDescriptor {
        let path: PathBuf = self.root.path().join("compose.yaml");
        std::fs::write(&path, text).expect("write definition");
        crate::infrastructure::compose::load_definition(&path).expect("valid definition")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
