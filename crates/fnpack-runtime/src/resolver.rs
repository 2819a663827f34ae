use crate::requirements::Requirements;
use crate::RuntimeError;
use std::path::Path;

/// Turns a dependency lockfile into a flat, pinned requirements list.
///
/// The output must be a pure function of the lockfile's contents.
pub trait DependencyResolver {
    fn name(&self) -> &str;

    fn resolve(&self, lockfile: &Path) -> Result<Requirements, RuntimeError>;
}

pub fn select_resolver(name: &str) -> Result<Box<dyn DependencyResolver>, RuntimeError> {
    match name {
        "pipenv" => Ok(Box::new(crate::pipenv::PipenvResolver::new())),
        "lockfile" => Ok(Box::new(crate::lockfile::LockfileResolver)),
        other => Err(RuntimeError::ResolverUnavailable(other.to_owned())),
    }
}
