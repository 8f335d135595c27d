// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Installation-wide configuration.
//!
//! Loaded from `~/.volman/config.yaml`; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: Defaults,
    pub paths: Paths,
    /// Per-project overrides, keyed by normalized project name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub projects: BTreeMap<String, ProjectConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub compress_format: String,
    pub keep_generations: u32,
    pub stop_before_backup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub backups: PathBuf,
    pub archives: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub keep_generations: Option<u32>,
}

fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".volman")
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            compress_format: "tar.gz".to_string(),
            keep_generations: 5,
            stop_before_backup: false,
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            backups: data_dir().join("backups"),
            archives: data_dir().join("archives"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            paths: Paths::default(),
            projects: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        data_dir().join("config.yaml")
    }

    /// Default metadata store location, beside the config file.
    pub fn default_store_path() -> PathBuf {
        data_dir().join("meta.db")
    }

    /// Load the config from a file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Retention generations for a project, honoring its override.
    pub fn keep_generations(&self, project: &str) -> u32 {
        self.projects
            .get(project)
            .and_then(|p| p.keep_generations)
            .unwrap_or(self.defaults.keep_generations)
    }

    /// Create the backup/archive directories if absent.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.paths.backups)?;
        std::fs::create_dir_all(&self.paths.archives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.defaults.compress_format, "tar.gz");
        assert_eq!(config.defaults.keep_generations, 5);
        assert!(!config.defaults.stop_before_backup);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.yaml")).unwrap();
        assert_eq!(config.defaults.keep_generations, 5);
    }

    #[test]
    fn test_project_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "defaults:\n  keep_generations: 3\nprojects:\n  myproj:\n    keep_generations: 9\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keep_generations("myproj"), 9);
        assert_eq!(config.keep_generations("other"), 3);
    }
}
