// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Invocation context.
//!
//! One `ProjectContext` is built per invocation and threaded by reference
//! through every workflow call as an explicit value, not process-wide state,
//! so tests can run contexts concurrently.

use crate::application::error::LifecycleError;
use crate::application::prompt::Prompter;
use crate::config::Config;
use crate::domain::engine::ContainerEngine;
use crate::domain::project::{resolve_project_name, ProjectDescriptor};
use crate::domain::store::MetadataStore;
use crate::infrastructure::compose;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub struct ProjectContext {
    pub engine: Arc<dyn ContainerEngine>,
    pub store: Arc<dyn MetadataStore>,
    pub prompter: Arc<dyn Prompter>,
    pub config: Config,
    /// Decoded definition, when one was found and loading it was requested.
    pub descriptor: Option<ProjectDescriptor>,
    /// Normalized project namespace token; may be empty without a project.
    pub project_name: String,
}

impl ProjectContext {
    pub fn new(
        engine: Arc<dyn ContainerEngine>,
        store: Arc<dyn MetadataStore>,
        prompter: Arc<dyn Prompter>,
        config: Config,
    ) -> Self {
        Self {
            engine,
            store,
            prompter,
            config,
            descriptor: None,
            project_name: String::new(),
        }
    }

    /// Load the project definition and resolve the project name.
    ///
    /// With no explicit path, the working directory is probed for the usual
    /// definition file names.
    pub fn load_project(
        &mut self,
        definition_path: Option<&Path>,
        project_override: Option<&str>,
    ) -> Result<(), LifecycleError> {
        let path = match definition_path {
            Some(path) => path.to_path_buf(),
            None => compose::find_definition_file(Path::new("."))
                .map_err(|_| LifecycleError::DefinitionNotFound)?,
        };

        let descriptor = compose::load_definition(&path)?;

        self.project_name = resolve_project_name(
            project_override,
            descriptor.declared_name.as_deref(),
            &descriptor.definition_path,
        );
        self.descriptor = Some(descriptor);
        Ok(())
    }

    /// Resolve a service alias or volume name to the physical volume name.
    ///
    /// Order: the loaded definition's mapping, then an already-existing
    /// physical name, then the project-prefixed input.
    pub async fn resolve_volume(&self, alias: &str) -> Result<String, LifecycleError> {
        if let Some(descriptor) = &self.descriptor {
            if let Some(mappings) = descriptor.volume_mappings(alias) {
                if let Some(first) = mappings.first() {
                    if mappings.len() > 1 {
                        let ignored: Vec<&str> = mappings[1..]
                            .iter()
                            .map(|m| m.volume_name.as_str())
                            .collect();
                        warn!(
                            service = alias,
                            ?ignored,
                            "service declares multiple named volumes; using the first"
                        );
                    }
                    return Ok(format!("{}_{}", self.project_name, first.volume_name));
                }
            }
        }

        if self.engine.volume_exists(alias).await? {
            return Ok(alias.to_string());
        }

        if !self.project_name.is_empty() {
            let prefixed = format!("{}_{}", self.project_name, alias);
            if self.engine.volume_exists(&prefixed).await? {
                return Ok(prefixed);
            }
        }

        Err(LifecycleError::VolumeNotFound(alias.to_string()))
    }

    /// The service declaring a physical volume, if the volume is managed by
    /// this project. `None` marks an unmanaged volume, not a failure.
    pub fn service_for_volume(&self, volume_name: &str) -> Option<String> {
        self.descriptor
            .as_ref()?
            .service_for_volume(volume_name, &self.project_name)
    }

    /// Every distinct physical volume of the loaded project.
    pub fn project_volumes(&self) -> Result<Vec<String>, LifecycleError> {
        let descriptor = self
            .descriptor
            .as_ref()
            .ok_or(LifecycleError::DefinitionNotFound)?;
        Ok(descriptor.all_full_volume_names(&self.project_name))
    }

    /// Project-scoped backup directory.
    pub fn backup_dir(&self) -> PathBuf {
        self.config.paths.backups.join(&self.project_name)
    }

    /// Project-scoped archive directory.
    pub fn archive_dir(&self) -> PathBuf {
        self.config.paths.archives.join(&self.project_name)
    }

    /// Retention generations applying to this project.
    pub fn keep_generations(&self) -> u32 {
        self.config.keep_generations(&self.project_name)
    }

    /// Candidate names a backup file for `alias` may be keyed under.
    ///
    /// The on-disk filename encodes the physical volume name while callers
    /// think in service names, so lookup spans every known alias: the input,
    /// the mapped service name, the physical name, and the physical name
    /// with the project prefix stripped.
    pub fn search_names(&self, alias: &str, resolved_volume: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        };

        push(alias);
        if let Some(service) = self.service_for_volume(resolved_volume) {
            push(&service);
        }
        push(resolved_volume);
        if !self.project_name.is_empty() {
            let prefix = format!("{}_", self.project_name);
            if let Some(short) = resolved_volume.strip_prefix(&prefix) {
                push(short);
            }
        }
        names
    }
}
