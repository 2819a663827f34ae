use super::{colorize_status, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use fnpack_core::{AssembleOutcome, BuildConfig, CoreError, Engine};
use fnpack_runtime::{check_build_prereqs, format_missing};
use fnpack_schema::{Architecture, BuildRequest, RuntimeId};
use std::path::PathBuf;
use tracing::debug;

pub struct BuildArgs {
    pub filename: PathBuf,
    pub pipfile_lock: PathBuf,
    pub packages: Vec<String>,
    pub root: PathBuf,
    pub runtime: String,
    pub architecture: Option<Architecture>,
}

pub fn run(args: &BuildArgs) -> Result<u8, CoreError> {
    let runtime = RuntimeId::parse(&args.runtime)?;

    let mut config = BuildConfig::from_env()?;
    if let Some(arch) = args.architecture {
        config.installer_settings.architecture = arch;
    }
    debug!("build config: {config:?}");

    if config.needs_prereq_check() {
        let missing = check_build_prereqs(&config.resolver, &config.installer);
        if !missing.is_empty() {
            return Err(CoreError::Prereqs(format_missing(&missing)));
        }
    }

    let engine = Engine::from_config(&config)?;
    let request = BuildRequest::new(&args.root, &args.pipfile_lock, args.packages.clone());

    let target = args.filename.display().to_string();
    let pb = spinner(&format!("building {target}..."));
    match engine.assemble(&args.filename, &request, &runtime) {
        Ok(AssembleOutcome::Reused) => {
            spin_ok(&pb, &format!("{target} {}", colorize_status("reused")));
        }
        Ok(AssembleOutcome::Built(report)) => {
            spin_ok(
                &pb,
                &format!(
                    "{target} {} ({} source, {} dependency entries)",
                    colorize_status("built"),
                    report.source_entries,
                    report.dependency_entries
                ),
            );
        }
        Err(e) => {
            spin_fail(&pb, &format!("{target} {}", colorize_status("failed")));
            return Err(e);
        }
    }
    Ok(EXIT_SUCCESS)
}
