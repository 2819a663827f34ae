//! File enumeration, fingerprinting, and archive writing for fnpack.
//!
//! This crate provides the storage layer: `FileSet` expands package
//! specifiers into a deterministically ordered list of regular files,
//! `fingerprint_files` streams them through SHA-256, and `ArchiveWriter`
//! writes zip entries with fixed timestamps and normalized permissions.

pub mod archive;
pub mod fileset;
pub mod fingerprint;

pub use archive::{entry_name, ArchiveWriter, ENTRY_MODE};
pub use fileset::{classify, list_files, InputKind, FileSet};
pub use fingerprint::{compute_identity, fingerprint_files};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("file not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("unsupported package type: {} ({kind})", path.display())]
    UnsupportedInput { path: PathBuf, kind: InputKind },
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("duplicate archive entry: {0}")]
    DuplicateEntry(String),
    #[error("path {} cannot be stored under {}", path.display(), base.display())]
    OutsideBase { path: PathBuf, base: PathBuf },
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("{0}")]
    Request(#[from] fnpack_schema::RequestError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_names_path() {
        let e = StoreError::MissingInput(PathBuf::from("root/Pipfile.lock"));
        assert_eq!(e.to_string(), "file not found: root/Pipfile.lock");
    }

    #[test]
    fn unsupported_input_names_path_and_kind() {
        let e = StoreError::UnsupportedInput {
            path: PathBuf::from("root/nope"),
            kind: InputKind::Missing,
        };
        let msg = e.to_string();
        assert!(msg.contains("root/nope"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn duplicate_entry_names_entry() {
        let e = StoreError::DuplicateEntry("pkg/a.py".to_owned());
        assert!(e.to_string().contains("pkg/a.py"));
    }
}
