//! Request decoding, build identity, and shared identifiers for fnpack.
//!
//! This crate defines the schema layer: the `BuildRequest` both components
//! operate on, the stdin query adapter used by the fingerprint command
//! (`parse_query_str`), the content-addressed build identity
//! (`BuildIdentity`), and validated identifiers for runtimes and target
//! architectures.

pub mod identity;
pub mod platform;
pub mod request;
pub mod types;

pub use identity::{BuildIdentity, ARCHIVE_EXTENSION, BUILD_DIR};
pub use platform::Architecture;
pub use request::{parse_query_reader, parse_query_str, BuildRequest};
pub use types::{BuildHash, RuntimeId};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read query: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON object passed through stdin: {0}")]
    InvalidQuery(#[from] serde_json::Error),
    #[error("JSON object must include keys: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),
    #[error("packages must be a JSON-encoded list of strings: {0}")]
    InvalidPackages(serde_json::Error),
    #[error("invalid runtime identifier '{0}': expected ASCII letters, digits, '.', '-' or '_'")]
    InvalidRuntime(String),
    #[error("unsupported architecture '{0}', expected x86_64 or arm64")]
    InvalidArchitecture(String),
    #[error("package '{0}' must be a relative path inside the root")]
    PackageOutsideRoot(String),
}
