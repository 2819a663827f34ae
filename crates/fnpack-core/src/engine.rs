use crate::concurrency::shutdown_requested;
use crate::config::BuildConfig;
use crate::CoreError;
use fnpack_runtime::{
    select_installer, select_resolver, DependencyInstaller, DependencyResolver, RuntimeError,
};
use fnpack_schema::{BuildIdentity, BuildRequest, RuntimeId};
use fnpack_store::{compute_identity, ArchiveWriter, FileSet, StoreError};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Mode of the persisted archive. Temporary files are created owner-only,
/// but later deploy steps may read the artifact as another user.
pub const ARCHIVE_FILE_MODE: u32 = 0o644;

/// Central orchestration engine for fnpack builds.
///
/// Owns the dependency resolver and installer selected for this run, and
/// drives fingerprinting and archive assembly through the store layer.
pub struct Engine {
    resolver: Box<dyn DependencyResolver>,
    installer: Box<dyn DependencyInstaller>,
    scratch_parent: Option<PathBuf>,
}

/// What `Engine::assemble` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleOutcome {
    /// The target already existed and was left untouched.
    Reused,
    Built(BuildReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub source_entries: usize,
    pub dependency_entries: usize,
    /// Packages handed to the installer; zero when it was skipped.
    pub installed_packages: usize,
}

impl BuildReport {
    pub fn total_entries(&self) -> usize {
        self.source_entries + self.dependency_entries
    }
}

impl Engine {
    pub fn new(
        resolver: Box<dyn DependencyResolver>,
        installer: Box<dyn DependencyInstaller>,
    ) -> Self {
        Self {
            resolver,
            installer,
            scratch_parent: None,
        }
    }

    pub fn from_config(config: &BuildConfig) -> Result<Self, CoreError> {
        let resolver = select_resolver(&config.resolver)?;
        let installer = select_installer(&config.installer, &config.installer_settings)?;
        ensure_available(installer.as_ref())?;
        debug!(
            "engine: resolver={} installer={}",
            resolver.name(),
            installer.name()
        );
        let mut engine = Self::new(resolver, installer);
        engine.scratch_parent.clone_from(&config.scratch_parent);
        Ok(engine)
    }

    /// Place dependency scratch directories under `dir` instead of the
    /// system temp dir.
    #[must_use]
    pub fn with_scratch_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_parent = Some(dir.into());
        self
    }

    /// Content hash and archive path for a request. Reads inputs only.
    pub fn fingerprint(request: &BuildRequest) -> Result<BuildIdentity, CoreError> {
        let identity = compute_identity(request)?;
        debug!("build hash {}", identity.build_hash);
        Ok(identity)
    }

    /// Build the archive at `target` from the request's packages and its
    /// installed dependencies.
    ///
    /// An existing `target` is returned as-is. Otherwise the archive is
    /// written to a sibling temporary file and moved into place only after
    /// the last entry is written, so a failed or interrupted build never
    /// leaves anything at `target`.
    pub fn assemble(
        &self,
        target: &Path,
        request: &BuildRequest,
        runtime: &RuntimeId,
    ) -> Result<AssembleOutcome, CoreError> {
        if target.is_file() {
            info!("reusing existing build {}", target.display());
            return Ok(AssembleOutcome::Reused);
        }
        if target.exists() {
            return Err(CoreError::TargetNotFile(target.to_path_buf()));
        }

        let lockfile = request.lockfile_path();
        if !lockfile.is_file() {
            return Err(StoreError::MissingInput(lockfile).into());
        }
        let sources = FileSet::for_sources(request)?;

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let partial = tempfile::Builder::new()
            .prefix(".fnpack-")
            .suffix(".partial")
            .tempfile_in(parent)?;
        let mut archive = ArchiveWriter::new(partial);
        let mut report = BuildReport::default();

        info!("adding service packages to build...");
        for path in &sources {
            check_interrupt()?;
            archive.add_relative(request.root(), path)?;
        }
        report.source_entries = sources.len();

        check_interrupt()?;
        info!("resolving dependencies from {}", lockfile.display());
        let requirements = self.resolver.resolve(&lockfile)?;

        let scratch = self.scratch_dir()?;
        if requirements.is_empty() {
            info!("no dependencies to install");
        } else {
            check_interrupt()?;
            info!(
                "installing {} dependencies for {runtime}...",
                requirements.package_count()
            );
            self.installer
                .install(&requirements, runtime, scratch.path())?;
            report.installed_packages = requirements.package_count();
        }

        check_interrupt()?;
        info!("adding dependencies to build...");
        let dependencies = FileSet::from_dir(scratch.path())?;
        for path in &dependencies {
            check_interrupt()?;
            archive.add_relative(scratch.path(), path)?;
        }
        report.dependency_entries = dependencies.len();

        let partial = archive.finish()?;
        partial
            .as_file()
            .set_permissions(fs::Permissions::from_mode(ARCHIVE_FILE_MODE))?;
        check_interrupt()?;
        partial.persist_noclobber(target).map_err(|e| e.error)?;
        scratch.close()?;

        info!(
            "wrote {} ({} entries)",
            target.display(),
            report.total_entries()
        );
        Ok(AssembleOutcome::Built(report))
    }

    fn scratch_dir(&self) -> Result<TempDir, CoreError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("fnpack-deps-");
        let dir = match &self.scratch_parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        debug!("dependency scratch dir {}", dir.path().display());
        Ok(dir)
    }
}

fn ensure_available(installer: &dyn DependencyInstaller) -> Result<(), CoreError> {
    if installer.available() {
        Ok(())
    } else {
        Err(RuntimeError::InstallerUnavailable(installer.name().to_owned()).into())
    }
}

fn check_interrupt() -> Result<(), CoreError> {
    if shutdown_requested() {
        return Err(CoreError::Interrupted);
    }
    Ok(())
}
