use crate::installer::DependencyInstaller;
use crate::requirements::Requirements;
use crate::RuntimeError;
use fnpack_schema::RuntimeId;
use std::fs;
use std::path::Path;

/// Deterministic installer that writes one stub module per requirement
/// without touching the network or a container engine.
#[derive(Default)]
pub struct MockInstaller {
    fail: bool,
}

impl MockInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// An installer that leaves a partial tree behind and then fails, the way
    /// an interrupted `pip install` does.
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

fn module_name(package: &str) -> String {
    package.to_ascii_lowercase().replace(['-', '.'], "_")
}

impl DependencyInstaller for MockInstaller {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    fn install(
        &self,
        requirements: &Requirements,
        runtime: &RuntimeId,
        target_dir: &Path,
    ) -> Result<(), RuntimeError> {
        for (line, name) in requirements.packages().zip(requirements.package_names()) {
            let module = module_name(name);
            let pkg_dir = target_dir.join(&module);
            fs::create_dir_all(&pkg_dir)?;
            fs::write(
                pkg_dir.join("__init__.py"),
                format!("__requirement__ = {line:?}\n__runtime__ = \"{runtime}\"\n"),
            )?;

            if self.fail {
                return Err(RuntimeError::ToolFailed {
                    tool: "mock installer".to_owned(),
                    code: Some(1),
                    detail: format!("simulated failure after installing {name}"),
                });
            }

            let dist_info = target_dir.join(format!("{module}-0.0.0.dist-info"));
            fs::create_dir_all(&dist_info)?;
            fs::write(
                dist_info.join("METADATA"),
                format!("Metadata-Version: 2.1\nName: {name}\nVersion: 0.0.0-mock\n"),
            )?;
        }

        if self.fail {
            return Err(RuntimeError::ToolFailed {
                tool: "mock installer".to_owned(),
                code: Some(1),
                detail: "simulated failure".to_owned(),
            });
        }
        Ok(())
    }
}
