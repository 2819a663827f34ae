mod commands;

use clap::{Parser, Subcommand};
use commands::EXIT_FAILURE;
use fnpack_core::install_signal_handler;
use fnpack_schema::Architecture;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Overrides `--verbose`/`--trace` when set to a level name such as `DEBUG`.
const LOG_ENV: &str = "LOG_LEVEL";

#[derive(Debug, Parser)]
#[command(
    name = "fnpack",
    version,
    about = "Reproducible deployment archives for serverless Python functions"
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace logging.
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fingerprint the inputs named by a JSON query on stdin and print the
    /// build hash and archive filename.
    Hash,
    /// Assemble the deployment archive for a function.
    Build {
        /// Archive to create; left untouched if it already exists.
        filename: PathBuf,
        /// Lockfile path, relative to the root.
        #[arg(long = "pipfile_lock", visible_alias = "pipfile-lock", value_name = "PATH")]
        pipfile_lock: PathBuf,
        /// Files or directories to include, relative to the root.
        #[arg(long, required = true, num_args = 1..)]
        packages: Vec<String>,
        /// Directory the lockfile and packages are resolved against.
        #[arg(long)]
        root: PathBuf,
        /// Runtime identifier, e.g. python3.12.
        #[arg(long)]
        runtime: String,
        /// Target architecture; overrides FNPACK_ARCHITECTURE.
        #[arg(long)]
        architecture: Option<Architecture>,
    },
}

/// Level named by `LOG_LEVEL`, case-insensitive. Anything that is not a
/// level name yields `None` so the flag-derived default applies.
fn env_level(value: Option<&str>) -> Option<LevelFilter> {
    value.and_then(|v| v.trim().parse::<LevelFilter>().ok())
}

fn init_logging(verbose: bool, trace: bool) {
    let default_level = if trace {
        LevelFilter::TRACE
    } else if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let level = env_level(std::env::var(LOG_ENV).ok().as_deref()).unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::default().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.trace);
    install_signal_handler();

    let result = match cli.command {
        Commands::Hash => commands::hash::run(),
        Commands::Build {
            filename,
            pipfile_lock,
            packages,
            root,
            runtime,
            architecture,
        } => commands::build::run(&commands::build::BuildArgs {
            filename,
            pipfile_lock,
            packages,
            root,
            runtime,
            architecture,
        }),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {}: {e}", e.class());
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
