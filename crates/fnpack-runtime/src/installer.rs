use crate::requirements::Requirements;
use crate::RuntimeError;
use fnpack_schema::{Architecture, RuntimeId};
use std::path::Path;

/// Installs a requirements list into a directory laid out the way the
/// target runtime's module search path expects.
///
/// Implementations must leave every installed file readable by the invoking
/// user.
pub trait DependencyInstaller {
    fn name(&self) -> &str;

    fn available(&self) -> bool;

    fn install(
        &self,
        requirements: &Requirements,
        runtime: &RuntimeId,
        target_dir: &Path,
    ) -> Result<(), RuntimeError>;
}

/// Settings shared by the installers that run inside a build image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    /// Image reference prefix; the runtime identifier is appended.
    pub image_prefix: String,
    pub architecture: Architecture,
    /// Names of host environment variables passed through to the installer.
    pub forward_env: Vec<String>,
}

pub const DEFAULT_IMAGE_PREFIX: &str = "public.ecr.aws/sam/build-";

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            image_prefix: DEFAULT_IMAGE_PREFIX.to_owned(),
            architecture: Architecture::default(),
            forward_env: vec!["CODEARTIFACT_AUTH_TOKEN".to_owned()],
        }
    }
}

impl InstallerSettings {
    pub fn image_for(&self, runtime: &RuntimeId) -> String {
        format!("{}{runtime}", self.image_prefix)
    }
}

pub fn select_installer(
    name: &str,
    settings: &InstallerSettings,
) -> Result<Box<dyn DependencyInstaller>, RuntimeError> {
    match name {
        "docker" => Ok(Box::new(crate::docker::DockerInstaller::new(
            settings.clone(),
        ))),
        "mock" => Ok(Box::new(crate::mock::MockInstaller::new())),
        "mock-failing" => Ok(Box::new(crate::mock::MockInstaller::failing())),
        other => Err(RuntimeError::InstallerUnavailable(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_valid_installers() {
        let settings = InstallerSettings::default();
        assert_eq!(select_installer("docker", &settings).unwrap().name(), "docker");
        assert_eq!(select_installer("mock", &settings).unwrap().name(), "mock");
        assert_eq!(
            select_installer("mock-failing", &settings).unwrap().name(),
            "mock"
        );
    }

    #[test]
    fn select_invalid_installer_fails() {
        assert!(select_installer("podman-compose", &InstallerSettings::default()).is_err());
    }

    #[test]
    fn image_uses_sam_build_images_by_default() {
        let settings = InstallerSettings::default();
        let runtime = RuntimeId::parse("python3.12").unwrap();
        assert_eq!(
            settings.image_for(&runtime),
            "public.ecr.aws/sam/build-python3.12"
        );
    }
}
