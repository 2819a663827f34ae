use crate::requirements::Requirements;
use crate::resolver::DependencyResolver;
use crate::RuntimeError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Resolves a `Pipfile.lock` by running `pipenv requirements` next to it.
pub struct PipenvResolver {
    program: String,
}

impl Default for PipenvResolver {
    fn default() -> Self {
        Self {
            program: "pipenv".to_owned(),
        }
    }
}

impl PipenvResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, lockfile: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("requirements").current_dir(lockfile_dir(lockfile));
        // Pin pipenv to the Pipfile beside this lockfile instead of letting it
        // search parent directories.
        if let Some(pipfile) = pipfile_for(lockfile) {
            cmd.env("PIPENV_PIPFILE", pipfile);
        }
        cmd
    }
}

impl DependencyResolver for PipenvResolver {
    fn name(&self) -> &'static str {
        "pipenv"
    }

    fn resolve(&self, lockfile: &Path) -> Result<Requirements, RuntimeError> {
        debug!("{} requirements in {}", self.program, lockfile_dir(lockfile).display());
        let output = self
            .command(lockfile)
            .output()
            .map_err(|source| RuntimeError::Spawn {
                tool: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RuntimeError::ToolFailed {
                tool: format!("{} requirements", self.program),
                code: output.status.code(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(Requirements::parse(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn lockfile_dir(lockfile: &Path) -> &Path {
    match lockfile.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// `Pipfile.lock` -> `Pipfile`; lockfiles not ending in `.lock` have no
/// sibling Pipfile by convention.
fn pipfile_for(lockfile: &Path) -> Option<PathBuf> {
    let name = lockfile.file_name()?.to_str()?;
    let stem = name.strip_suffix(".lock")?;
    let pipfile = lockfile.with_file_name(stem);
    pipfile.is_file().then_some(pipfile)
}
