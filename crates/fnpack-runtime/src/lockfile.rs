//! Direct `Pipfile.lock` reader.
//!
//! Produces the same shape of output as `pipenv requirements` for the
//! `default` section without needing pipenv on the host: an index line for
//! the first declared source followed by one `name[extras]==version; markers`
//! line per package, sorted by name.

use crate::requirements::Requirements;
use crate::resolver::DependencyResolver;
use crate::RuntimeError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PipfileLock {
    #[serde(rename = "_meta", default)]
    meta: LockMeta,
    #[serde(default)]
    default: BTreeMap<String, LockedPackage>,
}

#[derive(Debug, Default, Deserialize)]
struct LockMeta {
    #[serde(default)]
    sources: Vec<LockSource>,
}

#[derive(Debug, Deserialize)]
struct LockSource {
    url: String,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    version: Option<String>,
    markers: Option<String>,
    #[serde(default)]
    extras: Vec<String>,
}

pub struct LockfileResolver;

impl DependencyResolver for LockfileResolver {
    fn name(&self) -> &'static str {
        "lockfile"
    }

    fn resolve(&self, lockfile: &Path) -> Result<Requirements, RuntimeError> {
        let content = std::fs::read_to_string(lockfile)?;
        requirements_from_lock(&content)
    }
}

pub fn requirements_from_lock(content: &str) -> Result<Requirements, RuntimeError> {
    let lock: PipfileLock = serde_json::from_str(content)
        .map_err(|e| RuntimeError::InvalidLockfile(e.to_string()))?;

    let mut lines = Vec::with_capacity(lock.default.len() + 1);
    if let Some(source) = lock.meta.sources.first() {
        lines.push(format!("-i {}", source.url));
    }

    for (name, pkg) in &lock.default {
        // VCS, path, and URL dependencies carry no version pin.
        let version = pkg.version.as_deref().ok_or_else(|| {
            RuntimeError::InvalidLockfile(format!("package '{name}' has no pinned version"))
        })?;

        let mut line = name.clone();
        if !pkg.extras.is_empty() {
            line.push('[');
            line.push_str(&pkg.extras.join(","));
            line.push(']');
        }
        line.push_str(version);
        if let Some(markers) = &pkg.markers {
            line.push_str("; ");
            line.push_str(markers);
        }
        lines.push(line);
    }

    Ok(Requirements::from_lines(lines))
}
