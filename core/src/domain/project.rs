// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Project definition model.
//!
//! A project is described by a declarative service file (Compose syntax).
//! This module holds the decoded descriptor types, the named-volume
//! classification rules, and project-name resolution/normalization.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable consulted when neither an override nor a declared
/// project name is present.
pub const PROJECT_NAME_ENV: &str = "COMPOSE_PROJECT_NAME";

/// A decoded project definition. Loaded once per invocation and immutable
/// thereafter.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    /// The `name:` field of the definition file, if any.
    pub declared_name: Option<String>,
    pub services: BTreeMap<String, ServiceDescriptor>,
    /// Path the definition was loaded from, as given by the caller.
    pub definition_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub volumes: Vec<VolumeSpec>,
}

/// One entry of a service's `volumes:` list.
///
/// The short form is the `source:target[:mode]` string; the long form is the
/// mapping with explicit `source`/`target` and an optional `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VolumeSpec {
    Short(String),
    Long {
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        target: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl VolumeSpec {
    /// Extract `(source, target)` if this spec names a volume-backed mount.
    ///
    /// Short form splits on the first two colon fields; trailing segments
    /// (access-mode flags) are ignored. Long form requires non-empty source
    /// and target, and an explicit `type` other than `"volume"` excludes the
    /// entry.
    fn source_target(&self) -> Option<(&str, &str)> {
        match self {
            VolumeSpec::Short(s) => {
                let mut parts = s.splitn(3, ':');
                let source = parts.next()?;
                let target = parts.next()?;
                Some((source, target))
            }
            VolumeSpec::Long { source, target, kind } => {
                let source = source.as_deref().filter(|s| !s.is_empty())?;
                let target = target.as_deref().filter(|t| !t.is_empty())?;
                if let Some(kind) = kind {
                    if kind != "volume" {
                        return None;
                    }
                }
                Some((source, target))
            }
        }
    }
}

/// A service's use of a named volume, derived on demand and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMapping {
    pub service: String,
    pub volume_name: String,
    pub mount_path: String,
}

/// Bind-mount sources are paths; named volumes are bare tokens.
fn is_named_volume(source: &str) -> bool {
    !source.is_empty()
        && !source.starts_with('/')
        && !source.starts_with('.')
        && !source.starts_with('~')
}

impl ProjectDescriptor {
    /// Named-volume mappings declared by one service, in declaration order.
    pub fn volume_mappings(&self, service: &str) -> Option<Vec<VolumeMapping>> {
        let descriptor = self.services.get(service)?;
        let mut mappings = Vec::new();
        for spec in &descriptor.volumes {
            if let Some((source, target)) = spec.source_target() {
                if is_named_volume(source) {
                    mappings.push(VolumeMapping {
                        service: service.to_string(),
                        volume_name: source.to_string(),
                        mount_path: target.to_string(),
                    });
                }
            }
        }
        Some(mappings)
    }

    /// All named-volume mappings across every service.
    pub fn all_volume_mappings(&self) -> Vec<VolumeMapping> {
        let mut mappings = Vec::new();
        for service in self.services.keys() {
            if let Some(m) = self.volume_mappings(service) {
                mappings.extend(m);
            }
        }
        mappings
    }

    /// The physical volume name for a service's first declared named volume.
    ///
    /// Services declaring several named volumes resolve to the first one;
    /// the remainder are reported by the caller.
    pub fn full_volume_name(&self, service: &str, project_name: &str) -> Option<String> {
        let mappings = self.volume_mappings(service)?;
        let first = mappings.first()?;
        Some(format!("{}_{}", project_name, first.volume_name))
    }

    /// Every distinct physical volume name of the project.
    ///
    /// Two services sharing one declared volume contribute a single entry.
    pub fn all_full_volume_names(&self, project_name: &str) -> Vec<String> {
        let mut names = Vec::new();
        for mapping in self.all_volume_mappings() {
            let full = format!("{}_{}", project_name, mapping.volume_name);
            if !names.contains(&full) {
                names.push(full);
            }
        }
        names
    }

    /// Find the service that declares the given physical volume.
    ///
    /// A matching project prefix is stripped before scanning. `None` means
    /// the volume is unmanaged, which callers must not treat as a failure.
    pub fn service_for_volume(&self, volume_name: &str, project_name: &str) -> Option<String> {
        let prefix = format!("{}_", project_name);
        let short_name = volume_name.strip_prefix(&prefix).unwrap_or(volume_name);

        for service in self.services.keys() {
            if let Some(mappings) = self.volume_mappings(service) {
                if mappings.iter().any(|m| m.volume_name == short_name) {
                    return Some(service.clone());
                }
            }
        }
        None
    }
}

/// Normalize a candidate project name into the engine-safe token.
///
/// Lowercases, drops every character outside `[a-z0-9_.-]`, then strips a
/// leading run of separators. Total and idempotent; empty input stays empty.
pub fn normalize_project_name(name: &str) -> String {
    let filtered: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
        .collect();
    filtered.trim_start_matches(['-', '_', '.']).to_string()
}

/// Resolve the project name from the four prioritized sources.
///
/// Priority: explicit override, then the descriptor's declared name, then
/// `COMPOSE_PROJECT_NAME`, then the basename of the directory holding the
/// definition file. A definition path with no directory component falls back
/// to the basename of the process working directory.
pub fn resolve_project_name(
    override_name: Option<&str>,
    declared_name: Option<&str>,
    definition_path: &Path,
) -> String {
    let env = std::env::var(PROJECT_NAME_ENV).ok();
    let directory = definition_directory_basename(definition_path);
    resolve_project_name_with(
        override_name,
        declared_name,
        env.as_deref(),
        directory.as_deref(),
    )
}

/// Pure resolution core: sources are injected so the priority order can be
/// exercised exhaustively.
pub fn resolve_project_name_with(
    override_name: Option<&str>,
    declared_name: Option<&str>,
    env: Option<&str>,
    directory: Option<&str>,
) -> String {
    for candidate in [override_name, declared_name, env, directory] {
        if let Some(candidate) = candidate {
            if !candidate.is_empty() {
                return normalize_project_name(candidate);
            }
        }
    }
    String::new()
}

fn definition_directory_basename(definition_path: &Path) -> Option<String> {
    let dir = definition_path.parent().filter(|p| !p.as_os_str().is_empty());
    match dir {
        Some(dir) if dir != Path::new(".") => dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        // Bare filename or "./file": the live working directory names the
        // project, not the literal dot.
        _ => std::env::current_dir()
            .ok()
            .and_then(|cwd| cwd.file_name().map(|n| n.to_string_lossy().into_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(services: &[(&str, &[&str])]) -> ProjectDescriptor {
        let services = services
            .iter()
            .map(|(name, volumes)| {
                (
                    name.to_string(),
                    ServiceDescriptor {
                        image: Some("nginx".to_string()),
                        volumes: volumes
                            .iter()
                            .map(|v| VolumeSpec::Short(v.to_string()))
                            .collect(),
                    },
                )
            })
            .collect();
        ProjectDescriptor {
            declared_name: None,
            services,
            definition_path: PathBuf::from("/tmp/app/compose.yaml"),
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["MyProject", "--_weird..Name", "", "___", "a b c", "123-OK"] {
            let once = normalize_project_name(input);
            let twice = normalize_project_name(&once);
            assert_eq!(once, twice, "normalize must be idempotent for {input:?}");
            assert!(
                once.is_empty() || once.chars().next().unwrap().is_ascii_alphanumeric(),
                "normalized output must start alphanumeric: {once:?}"
            );
            assert!(once
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "-_.".contains(c)));
        }
    }

    #[test]
    fn test_normalize_strips_leading_separators() {
        assert_eq!(normalize_project_name("--My_Project"), "my_project");
        assert_eq!(normalize_project_name("._hidden"), "hidden");
        assert_eq!(normalize_project_name("...-_"), "");
    }

    #[test]
    fn test_resolution_priority_all_combinations() {
        // Sources are ordered; for every presence combination the
        // highest-priority present source must win.
        let sources = [
            Some("Override"),
            Some("Declared"),
            Some("EnvName"),
            Some("DirName"),
        ];
        for mask in 0u8..16 {
            let picked: Vec<Option<&str>> = (0..4)
                .map(|i| if mask & (1 << i) != 0 { sources[i] } else { None })
                .collect();
            let got = resolve_project_name_with(picked[0], picked[1], picked[2], picked[3]);
            let expected = picked
                .iter()
                .flatten()
                .next()
                .map(|s| normalize_project_name(s))
                .unwrap_or_default();
            assert_eq!(got, expected, "mask {mask:#06b}");
        }
    }

    #[test]
    fn test_resolution_skips_empty_sources() {
        assert_eq!(
            resolve_project_name_with(Some(""), Some("Declared"), None, None),
            "declared"
        );
    }

    #[test]
    fn test_bind_mount_sources_are_excluded() {
        let d = descriptor(&[(
            "web",
            &[
                "/abs/path:/data",
                "./rel:/data",
                "~/home:/data",
                "data:/var/lib/data",
            ],
        )]);
        let mappings = d.volume_mappings("web").unwrap();
        assert_eq!(
            mappings,
            vec![VolumeMapping {
                service: "web".to_string(),
                volume_name: "data".to_string(),
                mount_path: "/var/lib/data".to_string(),
            }]
        );
    }

    #[test]
    fn test_short_form_ignores_access_mode_suffix() {
        let d = descriptor(&[("db", &["pgdata:/var/lib/postgresql/data:ro"])]);
        let mappings = d.volume_mappings("db").unwrap();
        assert_eq!(mappings[0].volume_name, "pgdata");
        assert_eq!(mappings[0].mount_path, "/var/lib/postgresql/data");
    }

    #[test]
    fn test_long_form_type_filter() {
        let mut d = descriptor(&[]);
        d.services.insert(
            "db".to_string(),
            ServiceDescriptor {
                image: None,
                volumes: vec![
                    VolumeSpec::Long {
                        source: Some("data".to_string()),
                        target: Some("/data".to_string()),
                        kind: Some("volume".to_string()),
                    },
                    VolumeSpec::Long {
                        source: Some("cache".to_string()),
                        target: Some("/cache".to_string()),
                        kind: Some("tmpfs".to_string()),
                    },
                    VolumeSpec::Long {
                        source: Some("implicit".to_string()),
                        target: Some("/implicit".to_string()),
                        kind: None,
                    },
                    VolumeSpec::Long {
                        source: None,
                        target: Some("/no-source".to_string()),
                        kind: None,
                    },
                ],
            },
        );
        let names: Vec<String> = d
            .volume_mappings("db")
            .unwrap()
            .into_iter()
            .map(|m| m.volume_name)
            .collect();
        assert_eq!(names, vec!["data", "implicit"]);
    }

    #[test]
    fn test_shared_volume_yields_one_full_name() {
        let d = descriptor(&[("web", &["shared:/srv"]), ("worker", &["shared:/work"])]);
        assert_eq!(d.all_full_volume_names("p"), vec!["p_shared"]);
    }

    #[test]
    fn test_full_volume_name_uses_first_declared() {
        let d = descriptor(&[("db", &["primary:/a", "secondary:/b"])]);
        assert_eq!(d.full_volume_name("db", "proj"), Some("proj_primary".to_string()));
    }

    #[test]
    fn test_service_for_volume_strips_prefix() {
        let d = descriptor(&[("db", &["pgdata:/var/lib/postgresql/data"])]);
        assert_eq!(d.service_for_volume("proj_pgdata", "proj"), Some("db".to_string()));
        assert_eq!(d.service_for_volume("pgdata", "proj"), Some("db".to_string()));
        assert_eq!(d.service_for_volume("proj_other", "proj"), None);
    }
}
