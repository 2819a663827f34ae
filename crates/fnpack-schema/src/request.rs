use crate::RequestError;
use serde::Deserialize;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

/// Inputs shared by the fingerprint and archive commands.
///
/// `lockfile` and every entry of `packages` are interpreted relative to
/// `root`. Absolute entries replace the root, matching `Path::join`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub root: PathBuf,
    pub lockfile: PathBuf,
    pub packages: Vec<String>,
}

impl BuildRequest {
    pub fn new(
        root: impl Into<PathBuf>,
        lockfile: impl Into<PathBuf>,
        packages: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            root: root.into(),
            lockfile: lockfile.into(),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.root.join(&self.lockfile)
    }

    /// Package specifiers joined onto the root, in caller order.
    pub fn package_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.packages.iter().map(|p| self.root.join(p))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every package must stay below the root so its archive entry name is a
    /// plain relative path. Absolute specifiers and `..` components are
    /// rejected.
    pub fn validate_packages(&self) -> Result<(), RequestError> {
        for package in &self.packages {
            let escapes = Path::new(package).components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
            if escapes {
                return Err(RequestError::PackageOutsideRoot(package.clone()));
            }
        }
        Ok(())
    }
}

/// `packages` arrives double-encoded from Terraform's external data source
/// (a string holding a JSON list). A plain JSON list is accepted as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum PackagesField {
    Encoded(String),
    List(Vec<String>),
}

#[derive(Deserialize)]
struct RawQuery {
    root: Option<String>,
    pipfile_lock: Option<String>,
    packages: Option<PackagesField>,
}

/// Decode the fingerprint query object read from stdin.
pub fn parse_query_str(input: &str) -> Result<BuildRequest, RequestError> {
    let raw: RawQuery = serde_json::from_str(input)?;

    let mut missing = Vec::new();
    if raw.root.is_none() {
        missing.push("root");
    }
    if raw.pipfile_lock.is_none() {
        missing.push("pipfile_lock");
    }
    if raw.packages.is_none() {
        missing.push("packages");
    }

    match (raw.root, raw.pipfile_lock, raw.packages) {
        (Some(root), Some(lockfile), Some(packages)) => {
            let packages = match packages {
                PackagesField::Encoded(s) => {
                    serde_json::from_str(&s).map_err(RequestError::InvalidPackages)?
                }
                PackagesField::List(list) => list,
            };
            let request = BuildRequest::new(root, lockfile, packages);
            request.validate_packages()?;
            Ok(request)
        }
        _ => Err(RequestError::MissingKeys(missing)),
    }
}

pub fn parse_query_reader(mut reader: impl Read) -> Result<BuildRequest, RequestError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    parse_query_str(&input)
}
