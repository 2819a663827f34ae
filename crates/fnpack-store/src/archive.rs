use crate::StoreError;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::{Component, Path};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Permission bits given to every archived file: owner read-write, everyone
/// else read-only. The source file's own mode is never consulted.
pub const ENTRY_MODE: u32 = 0o644;

/// Zip writer producing reproducible entries.
///
/// Determinism guarantees:
/// - Every entry carries [`ENTRY_MODE`]
/// - Every timestamp is the zip epoch (1980-01-01 00:00:00)
/// - Entries are written in exactly the order they are added
/// - An entry name can be written only once; a repeat is an error
pub struct ArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    options: SimpleFileOptions,
    names: BTreeSet<String>,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(ENTRY_MODE);
        Self {
            zip: ZipWriter::new(inner),
            options,
            names: BTreeSet::new(),
        }
    }

    /// Stream the file at `source` into the archive under `name`.
    pub fn add_file(&mut self, name: &str, source: &Path) -> Result<(), StoreError> {
        if !self.names.insert(name.to_owned()) {
            return Err(StoreError::DuplicateEntry(name.to_owned()));
        }

        let mut src = File::open(source).map_err(|e| StoreError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        debug!("zipping {name}");
        self.zip.start_file(name, self.options)?;
        io::copy(&mut src, &mut self.zip).map_err(|e| StoreError::Read {
            path: source.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Add `source` under its path relative to `base`.
    pub fn add_relative(&mut self, base: &Path, source: &Path) -> Result<String, StoreError> {
        let name = entry_name(base, source)?;
        self.add_file(&name, source)?;
        Ok(name)
    }

    pub fn entry_count(&self) -> usize {
        self.names.len()
    }

    /// Write the central directory and return the underlying writer.
    pub fn finish(self) -> Result<W, StoreError> {
        Ok(self.zip.finish()?)
    }
}

/// Archive name of `path` relative to `base`, with `/` separators.
///
/// Paths that would escape the archive root (`..`, absolute components) are
/// rejected.
pub fn entry_name(base: &Path, path: &Path) -> Result<String, StoreError> {
    let outside = || StoreError::OutsideBase {
        path: path.to_path_buf(),
        base: base.to_path_buf(),
    };
    let rel = path.strip_prefix(base).map_err(|_| outside())?;

    let mut segments = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(segment) => segments.push(
                segment
                    .to_str()
                    .ok_or_else(|| StoreError::NonUtf8Path(path.to_path_buf()))?,
            ),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(outside())
            }
        }
    }
    if segments.is_empty() {
        return Err(outside());
    }
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Cursor, Read};
    use std::os::unix::fs::PermissionsExt;

    fn read_entries(data: Vec<u8>) -> Vec<(String, u32, Vec<u8>)> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut f = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                f.read_to_end(&mut content).unwrap();
                (f.name().to_owned(), f.unix_mode().unwrap(), content)
            })
            .collect()
    }

    #[test]
    fn entries_keep_insertion_order_and_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.py"), "bee").unwrap();
        fs::write(dir.path().join("a.py"), "ay").unwrap();

        let mut w = ArchiveWriter::new(Cursor::new(Vec::new()));
        w.add_relative(dir.path(), &dir.path().join("b.py")).unwrap();
        w.add_relative(dir.path(), &dir.path().join("a.py")).unwrap();
        assert_eq!(w.entry_count(), 2);
        let data = w.finish().unwrap().into_inner();

        let entries = read_entries(data);
        assert_eq!(entries[0].0, "b.py");
        assert_eq!(entries[0].2, b"bee");
        assert_eq!(entries[1].0, "a.py");
        assert_eq!(entries[1].2, b"ay");
    }

    #[test]
    fn permissions_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let secret = dir.path().join("secret.txt");
        fs::write(&secret, "s").unwrap();
        fs::set_permissions(&secret, fs::Permissions::from_mode(0o600)).unwrap();

        let mut w = ArchiveWriter::new(Cursor::new(Vec::new()));
        w.add_relative(dir.path(), &script).unwrap();
        w.add_relative(dir.path(), &secret).unwrap();
        let data = w.finish().unwrap().into_inner();

        for (name, mode, _) in read_entries(data) {
            assert_eq!(mode & 0o777, ENTRY_MODE, "{name} must be 0644");
        }
    }

    #[test]
    fn output_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg").join("mod.py"), "print(1)\n").unwrap();

        let build = || {
            let mut w = ArchiveWriter::new(Cursor::new(Vec::new()));
            w.add_relative(dir.path(), &dir.path().join("pkg").join("mod.py"))
                .unwrap();
            w.finish().unwrap().into_inner()
        };
        let first = build();
        fs::set_permissions(
            dir.path().join("pkg").join("mod.py"),
            fs::Permissions::from_mode(0o700),
        )
        .unwrap();
        assert_eq!(first, build(), "archive bytes must not depend on mtime or mode");
    }

    #[test]
    fn duplicate_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("a.py");
        fs::write(&f, "a").unwrap();

        let mut w = ArchiveWriter::new(Cursor::new(Vec::new()));
        w.add_file("a.py", &f).unwrap();
        match w.add_file("a.py", &f).unwrap_err() {
            StoreError::DuplicateEntry(name) => assert_eq!(name, "a.py"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn entry_name_uses_forward_slashes() {
        let base = Path::new("/srv/app");
        assert_eq!(
            entry_name(base, Path::new("/srv/app/pkg/sub/mod.py")).unwrap(),
            "pkg/sub/mod.py"
        );
        assert_eq!(
            entry_name(base, Path::new("/srv/app/./pkg/mod.py")).unwrap(),
            "pkg/mod.py"
        );
    }

    #[test]
    fn entry_name_rejects_escapes() {
        let base = Path::new("/srv/app");
        assert!(entry_name(base, Path::new("/srv/app/../etc/passwd")).is_err());
        assert!(entry_name(base, Path::new("/elsewhere/mod.py")).is_err());
        assert!(entry_name(base, base).is_err());
    }
}
