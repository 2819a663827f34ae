//! Core orchestration engine for fnpack.
//!
//! This crate ties together request decoding, file enumeration, and the
//! dependency backends into the `Engine`: `Engine::fingerprint` computes the
//! content hash and archive path for a request, and `Engine::assemble`
//! builds the archive at that path. It also provides environment-driven
//! configuration and interrupt handling.

pub mod concurrency;
pub mod config;
pub mod engine;

pub use concurrency::{install_signal_handler, shutdown_requested};
pub use config::BuildConfig;
pub use engine::{AssembleOutcome, BuildReport, Engine, ARCHIVE_FILE_MODE};

use fnpack_runtime::RuntimeError;
use fnpack_schema::RequestError;
use fnpack_store::StoreError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    Request(#[from] RequestError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Prereqs(String),
    #[error("build target {} exists and is not a regular file", .0.display())]
    TargetNotFile(std::path::PathBuf),
    #[error("interrupted")]
    Interrupted,
}

/// Coarse error taxonomy reported to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed request, missing or unsupported inputs. Retrying cannot help.
    InputValidation,
    /// The resolver or installer failed or could not be started.
    ExternalTool,
    /// Anything else that went wrong while assembling the archive.
    BuildFailed,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InputValidation => "input error",
            Self::ExternalTool => "external tool error",
            Self::BuildFailed => "build failed",
        };
        f.write_str(s)
    }
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Request(_)
            | Self::Store(
                StoreError::MissingInput(_)
                | StoreError::UnsupportedInput { .. }
                | StoreError::DuplicateEntry(_)
                | StoreError::OutsideBase { .. }
                | StoreError::NonUtf8Path(_)
                | StoreError::Request(_),
            )
            | Self::Runtime(RuntimeError::InvalidLockfile(_))
            | Self::TargetNotFile(_) => ErrorClass::InputValidation,
            Self::Runtime(RuntimeError::Io(_)) => ErrorClass::BuildFailed,
            Self::Runtime(_) | Self::Prereqs(_) => ErrorClass::ExternalTool,
            Self::Store(_) | Self::Io(_) | Self::Interrupted => ErrorClass::BuildFailed,
        }
    }
}
