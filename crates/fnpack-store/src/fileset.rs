use crate::StoreError;
use fnpack_schema::BuildRequest;
use std::fmt;
use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What a package specifier resolves to on disk, following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Directory,
    Missing,
    BrokenSymlink,
    Fifo,
    Socket,
    Device,
    Unknown,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::File => "file",
            Self::Directory => "directory",
            Self::Missing => "missing",
            Self::BrokenSymlink => "broken symlink",
            Self::Fifo => "fifo",
            Self::Socket => "socket",
            Self::Device => "device",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

pub fn classify(path: &Path) -> InputKind {
    match fs::metadata(path) {
        Ok(meta) => {
            let ft = meta.file_type();
            if ft.is_file() {
                InputKind::File
            } else if ft.is_dir() {
                InputKind::Directory
            } else if ft.is_fifo() {
                InputKind::Fifo
            } else if ft.is_socket() {
                InputKind::Socket
            } else if ft.is_block_device() || ft.is_char_device() {
                InputKind::Device
            } else {
                InputKind::Unknown
            }
        }
        Err(_) if path.symlink_metadata().is_ok() => InputKind::BrokenSymlink,
        Err(_) => InputKind::Missing,
    }
}

/// An ordered list of regular files contributing to a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    paths: Vec<PathBuf>,
}

impl FileSet {
    /// Every file that affects a build: the lockfile plus all package files,
    /// sorted by full path string.
    ///
    /// The final sort is what makes the fingerprint independent of both the
    /// caller's package order and the filesystem's directory order.
    pub fn for_fingerprint(request: &BuildRequest) -> Result<Self, StoreError> {
        request.validate_packages()?;
        let lockfile = request.lockfile_path();
        if !lockfile.is_file() {
            return Err(StoreError::MissingInput(lockfile));
        }

        let mut paths = vec![lockfile];
        for package in request.package_paths() {
            paths.extend(expand_package(&package)?);
        }
        sort_paths(&mut paths);

        debug!("fingerprint file set: {} files", paths.len());
        Ok(Self { paths })
    }

    /// Local source files to archive. Packages keep the caller's order; each
    /// directory expands in sorted order. The lockfile is not included.
    pub fn for_sources(request: &BuildRequest) -> Result<Self, StoreError> {
        request.validate_packages()?;
        let mut paths = Vec::new();
        for package in request.package_paths() {
            paths.extend(expand_package(&package)?);
        }
        Ok(Self { paths })
    }

    /// All regular files below `dir`, sorted.
    pub fn from_dir(dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            paths: list_files(dir)?,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Expand one package path: a file stands for itself, a directory for every
/// regular file below it.
pub fn expand_package(path: &Path) -> Result<Vec<PathBuf>, StoreError> {
    match classify(path) {
        InputKind::File => Ok(vec![path.to_path_buf()]),
        InputKind::Directory => list_files(path),
        kind => Err(StoreError::UnsupportedInput {
            path: path.to_path_buf(),
            kind,
        }),
    }
}

/// Recursively list regular files below `dir`, following symlinks, sorted by
/// path string.
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        let ft = entry.file_type();
        if ft.is_file() {
            paths.push(entry.into_path());
        } else if !ft.is_dir() {
            warn!("skipping non-regular file: {}", entry.path().display());
        }
    }
    sort_paths(&mut paths);
    Ok(paths)
}

// Byte order of the whole path, not component order: "pkg-x/a" sorts before "pkg/a".
fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use fnpack_schema::RequestError;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("Pipfile.lock"), "lock").unwrap();
        fs::create_dir_all(root.join("pkg").join("sub")).unwrap();
        fs::write(root.join("pkg").join("b.py"), "y").unwrap();
        fs::write(root.join("pkg").join("a.py"), "x").unwrap();
        fs::write(root.join("pkg").join("sub").join("c.py"), "z").unwrap();
        fs::write(root.join("handler.py"), "h").unwrap();
        dir
    }

    fn relative(set: &FileSet, root: &Path) -> Vec<String> {
        set.iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn fingerprint_set_includes_lockfile_and_sorts() {
        let dir = fixture();
        let req = BuildRequest::new(dir.path(), "Pipfile.lock", ["pkg", "handler.py"]);
        let set = FileSet::for_fingerprint(&req).unwrap();
        assert_eq!(
            relative(&set, dir.path()),
            vec!["Pipfile.lock", "handler.py", "pkg/a.py", "pkg/b.py", "pkg/sub/c.py"]
        );
    }

    #[test]
    fn fingerprint_set_ignores_package_order() {
        let dir = fixture();
        let a = BuildRequest::new(dir.path(), "Pipfile.lock", ["pkg", "handler.py"]);
        let b = BuildRequest::new(dir.path(), "Pipfile.lock", ["handler.py", "pkg"]);
        assert_eq!(
            FileSet::for_fingerprint(&a).unwrap(),
            FileSet::for_fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn source_set_keeps_package_order_and_skips_lockfile() {
        let dir = fixture();
        let req = BuildRequest::new(dir.path(), "Pipfile.lock", ["pkg", "handler.py"]);
        let set = FileSet::for_sources(&req).unwrap();
        assert_eq!(
            relative(&set, dir.path()),
            vec!["pkg/a.py", "pkg/b.py", "pkg/sub/c.py", "handler.py"]
        );
    }

    #[test]
    fn sort_is_by_path_string() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::create_dir_all(dir.path().join("pkg-extra")).unwrap();
        fs::write(dir.path().join("pkg").join("a.py"), "").unwrap();
        fs::write(dir.path().join("pkg-extra").join("a.py"), "").unwrap();

        let files = list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["pkg-extra/a.py", "pkg/a.py"]);
    }

    #[test]
    fn missing_lockfile_is_reported() {
        let dir = fixture();
        let req = BuildRequest::new(dir.path(), "nope.lock", ["pkg"]);
        match FileSet::for_fingerprint(&req).unwrap_err() {
            StoreError::MissingInput(path) => assert_eq!(path, dir.path().join("nope.lock")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lockfile_directory_is_missing_input() {
        let dir = fixture();
        let req = BuildRequest::new(dir.path(), "pkg", Vec::<String>::new());
        assert!(matches!(
            FileSet::for_fingerprint(&req),
            Err(StoreError::MissingInput(_))
        ));
    }

    #[test]
    fn missing_package_names_exact_path() {
        let dir = fixture();
        let req = BuildRequest::new(dir.path(), "Pipfile.lock", ["pkg", "does-not-exist"]);
        match FileSet::for_fingerprint(&req).unwrap_err() {
            StoreError::UnsupportedInput { path, kind } => {
                assert_eq!(path, dir.path().join("does-not-exist"));
                assert_eq!(kind, InputKind::Missing);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parent_relative_package_rejected_by_both_sets() {
        let dir = fixture();
        fs::create_dir_all(dir.path().join("common")).unwrap();
        fs::write(dir.path().join("common").join("util.py"), "u").unwrap();
        fs::create_dir_all(dir.path().join("svc")).unwrap();
        fs::write(dir.path().join("svc").join("Pipfile.lock"), "lock").unwrap();

        let req = BuildRequest::new(dir.path().join("svc"), "Pipfile.lock", ["../common"]);
        assert!(matches!(
            FileSet::for_fingerprint(&req),
            Err(StoreError::Request(RequestError::PackageOutsideRoot(_)))
        ));
        assert!(matches!(
            FileSet::for_sources(&req),
            Err(StoreError::Request(RequestError::PackageOutsideRoot(_)))
        ));
    }

    #[test]
    fn broken_symlink_package_is_unsupported() {
        let dir = fixture();
        std::os::unix::fs::symlink("nowhere", dir.path().join("dangling")).unwrap();
        assert_eq!(classify(&dir.path().join("dangling")), InputKind::BrokenSymlink);
        let req = BuildRequest::new(dir.path(), "Pipfile.lock", ["dangling"]);
        assert!(matches!(
            FileSet::for_sources(&req),
            Err(StoreError::UnsupportedInput {
                kind: InputKind::BrokenSymlink,
                ..
            })
        ));
    }

    #[test]
    fn symlinked_directories_are_followed() {
        let dir = fixture();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("shared.py"), "s").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("pkg").join("linked")).unwrap();

        let files = list_files(&dir.path().join("pkg")).unwrap();
        assert!(files
            .iter()
            .any(|p| p.ends_with("linked/shared.py")));
    }

    #[test]
    fn empty_directory_expands_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileSet::from_dir(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn classify_kinds() {
        let dir = fixture();
        assert_eq!(classify(&dir.path().join("handler.py")), InputKind::File);
        assert_eq!(classify(&dir.path().join("pkg")), InputKind::Directory);
        assert_eq!(classify(&dir.path().join("absent")), InputKind::Missing);
    }
}
