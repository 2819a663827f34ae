use crate::fileset::FileSet;
use crate::StoreError;
use fnpack_schema::{BuildHash, BuildIdentity, BuildRequest};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// SHA-256 over the raw contents of `paths`, concatenated in the given order.
///
/// Nothing is mixed in between files: no names, no lengths. Renaming a file
/// only changes the digest if it moves the file to a different position in
/// the sorted order.
pub fn fingerprint_files(paths: &[PathBuf]) -> Result<BuildHash, StoreError> {
    let mut hasher = Sha256::new();
    for path in paths {
        let mut file = File::open(path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        io::copy(&mut file, &mut hasher).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
    }
    Ok(BuildHash::new(format!("{:x}", hasher.finalize())))
}

/// Fingerprint every input of `request` and derive the archive path from it.
pub fn compute_identity(request: &BuildRequest) -> Result<BuildIdentity, StoreError> {
    let files = FileSet::for_fingerprint(request)?;
    let hash = fingerprint_files(files.paths())?;
    Ok(BuildIdentity::from_hash(hash))
}
