//! `pubspec.lock` reader.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::model::{Dependency, DependencySource};

/// Default lockfile name in the project root.
pub const LOCKFILE_NAME: &str = "pubspec.lock";

#[derive(Deserialize)]
struct PubspecLock {
    #[serde(default)]
    packages: BTreeMap<String, LockedPackage>,
}

#[derive(Deserialize)]
struct LockedPackage {
    version: Option<String>,
    source: Option<DependencySource>,
}

/// Reads every locked package, sorted by name.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML.
pub fn read_lockfile(path: &Path) -> Result<Vec<Dependency>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_lockfile(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn parse_lockfile(content: &str) -> Result<Vec<Dependency>> {
    let lock: PubspecLock = serde_yaml::from_str(content)?;

    Ok(lock
        .packages
        .into_iter()
        .map(|(name, pkg)| Dependency {
            name,
            version: pkg.version.unwrap_or_else(|| "unknown".to_string()),
            source: pkg.source.unwrap_or(DependencySource::Hosted),
        })
        .collect())
}
