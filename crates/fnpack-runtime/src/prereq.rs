use std::fmt;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: &'static str,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

pub(crate) fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check the host tools needed by the selected resolver and installer.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_build_prereqs(resolver: &str, installer: &str) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if resolver == "pipenv" && !command_exists("pipenv") {
        missing.push(MissingPrereq {
            name: "pipenv",
            purpose: "exporting Pipfile.lock as a requirements list",
            install_hint: "pip install --user pipenv",
        });
    }

    if installer == "docker" {
        if !command_exists("docker") {
            missing.push(MissingPrereq {
                name: "docker",
                purpose: "installing dependencies inside the runtime's build image",
                install_hint: "https://docs.docker.com/engine/install/",
            });
        }
        if !command_exists("pip") {
            missing.push(MissingPrereq {
                name: "pip",
                purpose: "locating the host package cache",
                install_hint: "apt install python3-pip | dnf install python3-pip | brew install python",
            });
        }
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nfnpack needs these tools to install function dependencies.");
    msg
}
