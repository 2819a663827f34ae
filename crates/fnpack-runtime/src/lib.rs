//! Dependency resolution and installation backends for fnpack.
//!
//! This crate implements the external-tool layer behind two capability
//! traits: `DependencyResolver` turns a lockfile into a pinned
//! `Requirements` list (`pipenv requirements`, or a direct Pipfile.lock
//! reader), and `DependencyInstaller` materializes that list into a target
//! directory (a runtime-matched docker build image, or a deterministic mock).
//! It also provides prerequisite checks for the host tools.

pub mod docker;
pub mod host;
pub mod installer;
pub mod lockfile;
pub mod mock;
pub mod pipenv;
pub mod prereq;
pub mod requirements;
pub mod resolver;

pub use installer::{select_installer, DependencyInstaller, InstallerSettings};
pub use prereq::{check_build_prereqs, format_missing, MissingPrereq};
pub use requirements::Requirements;
pub use resolver::{select_resolver, DependencyResolver};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },
    #[error("{tool} exited with {}: {detail}", exit_label(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        detail: String,
    },
    #[error("dependency resolver '{0}' is not available")]
    ResolverUnavailable(String),
    #[error("dependency installer '{0}' is not available")]
    InstallerUnavailable(String),
    #[error("invalid lockfile: {0}")]
    InvalidLockfile(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_owned(),
    }
}
