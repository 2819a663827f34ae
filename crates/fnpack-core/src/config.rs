//! Environment-driven settings.
//!
//! Every knob has a default matching the production pipeline, so a bare
//! environment yields a docker build against the public SAM build images.

use crate::CoreError;
use fnpack_runtime::InstallerSettings;
use fnpack_schema::Architecture;
use std::path::PathBuf;

pub const ENV_SCRATCH_PARENT: &str = "RUNNER_TEMP";
pub const ENV_IMAGE_PREFIX: &str = "FNPACK_IMAGE_PREFIX";
pub const ENV_ARCHITECTURE: &str = "FNPACK_ARCHITECTURE";
pub const ENV_FORWARD_ENV: &str = "FNPACK_FORWARD_ENV";
pub const ENV_RESOLVER: &str = "FNPACK_RESOLVER";
pub const ENV_INSTALLER: &str = "FNPACK_INSTALLER";
pub const ENV_SKIP_PREREQS: &str = "FNPACK_SKIP_PREREQS";

pub const DEFAULT_RESOLVER: &str = "pipenv";
pub const DEFAULT_INSTALLER: &str = "docker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Parent for the dependency scratch directory; the system temp dir
    /// when unset.
    pub scratch_parent: Option<PathBuf>,
    pub resolver: String,
    pub installer: String,
    pub installer_settings: InstallerSettings,
    pub skip_prereqs: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            scratch_parent: None,
            resolver: DEFAULT_RESOLVER.to_owned(),
            installer: DEFAULT_INSTALLER.to_owned(),
            installer_settings: InstallerSettings::default(),
            skip_prereqs: false,
        }
    }
}

impl BuildConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(ENV_SCRATCH_PARENT) {
            config.scratch_parent = Some(PathBuf::from(dir));
        }
        if let Some(prefix) = get(ENV_IMAGE_PREFIX) {
            config.installer_settings.image_prefix = prefix;
        }
        if let Some(arch) = get(ENV_ARCHITECTURE) {
            config.installer_settings.architecture = arch.parse::<Architecture>()?;
        }
        if let Some(names) = lookup(ENV_FORWARD_ENV) {
            config.installer_settings.forward_env = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }
        if let Some(resolver) = get(ENV_RESOLVER) {
            config.resolver = resolver;
        }
        if let Some(installer) = get(ENV_INSTALLER) {
            config.installer = installer;
        }
        config.skip_prereqs = get(ENV_SKIP_PREREQS).is_some_and(|v| v == "1");

        Ok(config)
    }

    /// Offline backends need no host tools.
    pub fn needs_prereq_check(&self) -> bool {
        !self.skip_prereqs && (self.resolver == DEFAULT_RESOLVER || self.installer == DEFAULT_INSTALLER)
    }
}
