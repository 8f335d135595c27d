// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Definition-file loading.
//!
//! Environment substitution runs over the raw file text before YAML
//! decoding, so defaults may appear anywhere, including inside the declared
//! project name.

use crate::domain::project::{ProjectDescriptor, ServiceDescriptor};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// File names probed, in order, when no explicit definition path is given.
pub const DEFINITION_FILE_CANDIDATES: [&str; 4] = [
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("definition file not found in {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    services: BTreeMap<String, ServiceDescriptor>,
}

/// Search a directory for a definition file.
pub fn find_definition_file(dir: &Path) -> Result<PathBuf, DefinitionError> {
    for candidate in DEFINITION_FILE_CANDIDATES {
        let path = dir.join(candidate);
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(DefinitionError::NotFound(dir.to_path_buf()))
}

/// Load and decode a definition file, substituting environment variables in
/// the raw text first.
pub fn load_definition(path: &Path) -> Result<ProjectDescriptor, DefinitionError> {
    let text = std::fs::read_to_string(path).map_err(|source| DefinitionError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let expanded = expand_env_vars(&text);

    let raw: RawDefinition =
        serde_yaml::from_str(&expanded).map_err(|source| DefinitionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(ProjectDescriptor {
        declared_name: raw.name.filter(|n| !n.is_empty()),
        services: raw.services,
        definition_path: path.to_path_buf(),
    })
}

// Escape forms ($$ and $${...}) must win over generic expansion, so they
// come first in the alternation.
static SUBSTITUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$\{[^}]*\}|\$\$|\$\{[^}]*\}|\$[A-Za-z_][A-Za-z0-9_]*")
        .expect("substitution pattern is valid")
});

static VAR_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").expect("variable-name pattern is valid")
});

/// Shell-style environment substitution against the process environment.
///
/// Supported forms: `$NAME`, `${NAME}`, `${NAME:-default}`, `${NAME-default}`.
/// `$$`/`$${...}` emit the literal `$`/`${...}`. Malformed patterns such as
/// `${}`, `${1}` and `${-default}` pass through verbatim. Total: the result
/// is always defined.
pub fn expand_env_vars(text: &str) -> String {
    expand_env_vars_with(text, |name| std::env::var(name).ok())
}

/// Substitution core with an injected variable lookup. `None` means unset;
/// `Some("")` means set-but-empty; the two differ for `${NAME-default}`.
pub fn expand_env_vars_with(
    text: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> String {
    SUBSTITUTION
        .replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            if let Some(rest) = matched.strip_prefix("$$") {
                // Escape form: drop one dollar, emit the rest untouched.
                return format!("${rest}");
            }
            if let Some(inner) = matched.strip_prefix("${").and_then(|m| m.strip_suffix('}')) {
                return expand_braced(matched, inner, &lookup);
            }
            // $NAME
            let name = &matched[1..];
            lookup(name).unwrap_or_default()
        })
        .into_owned()
}

fn expand_braced(
    matched: &str,
    inner: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> String {
    let Some(name_match) = VAR_NAME.find(inner) else {
        // ${}, ${1}, ${-default}: not a variable reference at all.
        return matched.to_string();
    };
    let name = name_match.as_str();
    let rest = &inner[name_match.end()..];
    let value = lookup(name);

    if rest.is_empty() {
        return value.unwrap_or_default();
    }
    if let Some(default) = rest.strip_prefix(":-") {
        // Unset or set-to-empty takes the default.
        return match value {
            Some(v) if !v.is_empty() => v,
            _ => default.to_string(),
        };
    }
    if let Some(default) = rest.strip_prefix('-') {
        // Only unset takes the default; set-but-empty stays empty.
        return match value {
            Some(v) => v,
            None => default.to_string(),
        };
    }
    // Unsupported operator: leave the pattern as written.
    matched.to_string()
}
