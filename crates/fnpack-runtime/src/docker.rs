use crate::host::{current_gid, current_uid, platform_override};
use crate::installer::{DependencyInstaller, InstallerSettings};
use crate::prereq::command_exists;
use crate::requirements::Requirements;
use crate::RuntimeError;
use fnpack_schema::{Architecture, RuntimeId};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Working directory inside the build image; also where the function code
/// lives on the deployed runtime.
pub const CONTAINER_WORKDIR: &str = "/var/task";
const CONTAINER_PIP_CACHE: &str = "/root/.cache/pip";
const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Shell-escape a string for safe interpolation into a POSIX shell command.
fn shell_quote(s: &str) -> String {
    // Single-quoting in POSIX shell: replace ' with '\'' then wrap in '
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn quote_all(args: &[&str]) -> String {
    args.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Installs requirements with `pip` inside the runtime's build image.
///
/// The scratch directory is bind-mounted at [`CONTAINER_WORKDIR`]. The
/// container runs as root, so the installed tree is handed back to the
/// invoking user with `chown` before the container exits.
pub struct DockerInstaller {
    settings: InstallerSettings,
    program: String,
    pip_program: String,
    host: Option<Architecture>,
    uid: u32,
    gid: u32,
}

impl DockerInstaller {
    pub fn new(settings: InstallerSettings) -> Self {
        Self {
            settings,
            program: "docker".to_owned(),
            pip_program: "pip".to_owned(),
            host: Architecture::host(),
            uid: current_uid(),
            gid: current_gid(),
        }
    }

    /// Host pip cache directory, shared with the container so repeated builds
    /// skip downloads. Builds proceed without it when pip cannot report one.
    fn pip_cache_dir(&self) -> Option<PathBuf> {
        let output = match Command::new(&self.pip_program)
            .args(["cache", "dir"])
            .output()
        {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                warn!(
                    "pip cache unavailable: {}",
                    String::from_utf8_lossy(&o.stderr).trim()
                );
                return None;
            }
            Err(e) => {
                warn!("pip cache unavailable: {e}");
                return None;
            }
        };
        let dir = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        if dir.is_empty() {
            return None;
        }
        let dir = PathBuf::from(dir);
        // Docker would create a missing mount source as root.
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("cannot create pip cache {}: {e}", dir.display());
            return None;
        }
        Some(dir)
    }

    fn install_script(&self) -> String {
        let requirements = format!("{CONTAINER_WORKDIR}/{REQUIREMENTS_FILE}");
        let owner = format!("{}:{}", self.uid, self.gid);
        let install = [
            "pip",
            "install",
            "--no-compile",
            "--requirement",
            requirements.as_str(),
            "--target",
            CONTAINER_WORKDIR,
        ];
        let chown = ["chown", "-R", owner.as_str(), CONTAINER_WORKDIR];

        format!("{} && {}", quote_all(&install), quote_all(&chown))
    }

    /// Arguments passed to `docker`, excluding the program name.
    pub fn run_args(
        &self,
        runtime: &RuntimeId,
        mount_dir: &Path,
        pip_cache: Option<&Path>,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec!["run".into(), "--rm".into()];

        if let Some(platform) = platform_override(self.host, self.settings.architecture) {
            args.push("--platform".into());
            args.push(platform.into());
        }

        args.push("-w".into());
        args.push(CONTAINER_WORKDIR.into());
        args.push("-v".into());
        args.push(format!("{}:{CONTAINER_WORKDIR}:z", mount_dir.display()));

        for name in &self.settings.forward_env {
            args.push("-e".into());
            args.push(name.clone());
        }

        if let Some(cache) = pip_cache {
            args.push("-v".into());
            args.push(format!("{}:{CONTAINER_PIP_CACHE}:z", cache.display()));
        }

        args.push(self.settings.image_for(runtime));
        args.push("/bin/sh".into());
        args.push("-c".into());
        args.push(self.install_script());
        args
    }
}

impl DependencyInstaller for DockerInstaller {
    fn name(&self) -> &'static str {
        "docker"
    }

    fn available(&self) -> bool {
        command_exists(&self.program)
    }

    fn install(
        &self,
        requirements: &Requirements,
        runtime: &RuntimeId,
        target_dir: &Path,
    ) -> Result<(), RuntimeError> {
        let mount_dir = fs::canonicalize(target_dir)?;
        let requirements_file = mount_dir.join(REQUIREMENTS_FILE);
        fs::write(&requirements_file, requirements.to_file_contents())?;

        let pip_cache = self.pip_cache_dir();
        let args = self.run_args(runtime, &mount_dir, pip_cache.as_deref());
        let image = self.settings.image_for(runtime);
        info!(
            "installing {} packages with {image}",
            requirements.package_count()
        );
        debug!("{} {}", self.program, args.join(" "));

        // Installer chatter goes to stderr; stdout is reserved for results.
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(std::io::stderr())
            .status()
            .map_err(|source| RuntimeError::Spawn {
                tool: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(RuntimeError::ToolFailed {
                tool: format!("{} run", self.program),
                code: status.code(),
                detail: format!("dependency installation in {image} failed"),
            });
        }

        fs::remove_file(&requirements_file)?;
        Ok(())
    }
}
