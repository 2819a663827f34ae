use crate::types::BuildHash;
use serde::Serialize;

/// Directory, relative to the orchestrator's working directory, that holds built archives.
pub const BUILD_DIR: &str = "builds";

/// Extension of every built archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Content-addressed identity of a build: its fingerprint and the archive
/// path derived from it.
///
/// Serializes to the exact object the fingerprint command prints:
/// `{"build_hash": "...", "filename": "builds/<hash>.zip"}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BuildIdentity {
    pub build_hash: BuildHash,
    pub filename: String,
}

impl BuildIdentity {
    pub fn from_hash(build_hash: BuildHash) -> Self {
        let filename = format!("{BUILD_DIR}/{build_hash}.{ARCHIVE_EXTENSION}");
        Self {
            build_hash,
            filename,
        }
    }
}
