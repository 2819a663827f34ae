//! Fingerprint properties: determinism, order independence, and content
//! sensitivity over real directory trees.

use fnpack_schema::BuildRequest;
use fnpack_store::{compute_identity, StoreError};
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn service_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Pipfile.lock", r#"{"default": {}}"#);
    write(dir.path(), "src/app/__init__.py", "");
    write(dir.path(), "src/app/handler.py", "def handler(e, c):\n    return e\n");
    write(dir.path(), "common/util.py", "X = 1\n");
    write(dir.path(), "common/data/table.csv", "a,b\n1,2\n");
    dir
}

fn hash(root: &Path, packages: &[&str]) -> String {
    let req = BuildRequest::new(root, "Pipfile.lock", packages.iter().copied());
    compute_identity(&req).unwrap().build_hash.into_inner()
}

#[test]
fn repeated_runs_agree() {
    let tree = service_tree();
    assert_eq!(
        hash(tree.path(), &["src", "common"]),
        hash(tree.path(), &["src", "common"])
    );
}

#[test]
fn package_order_does_not_matter() {
    let tree = service_tree();
    assert_eq!(
        hash(tree.path(), &["src", "common"]),
        hash(tree.path(), &["common", "src"])
    );
}

#[test]
fn creation_order_does_not_matter() {
    let a = tempfile::tempdir().unwrap();
    write(a.path(), "Pipfile.lock", "lock");
    write(a.path(), "pkg/z.py", "z");
    write(a.path(), "pkg/a.py", "a");
    write(a.path(), "pkg/m/n.py", "n");

    let b = tempfile::tempdir().unwrap();
    write(b.path(), "pkg/m/n.py", "n");
    write(b.path(), "pkg/a.py", "a");
    write(b.path(), "Pipfile.lock", "lock");
    write(b.path(), "pkg/z.py", "z");

    assert_eq!(hash(a.path(), &["pkg"]), hash(b.path(), &["pkg"]));
}

#[test]
fn single_byte_change_is_detected() {
    let tree = service_tree();
    let before = hash(tree.path(), &["src", "common"]);
    write(tree.path(), "common/util.py", "X = 2\n");
    assert_ne!(before, hash(tree.path(), &["src", "common"]));
}

#[test]
fn lockfile_change_is_detected() {
    let tree = service_tree();
    let before = hash(tree.path(), &["src"]);
    write(tree.path(), "Pipfile.lock", r#"{"default": {"requests": {}}}"#);
    assert_ne!(before, hash(tree.path(), &["src"]));
}

#[test]
fn rename_that_reorders_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Pipfile.lock", "lock");
    write(dir.path(), "pkg/a.py", "x");
    write(dir.path(), "pkg/b.py", "y");
    let before = hash(dir.path(), &["pkg"]);

    fs::rename(dir.path().join("pkg/a.py"), dir.path().join("pkg/c.py")).unwrap();
    assert_ne!(before, hash(dir.path(), &["pkg"]));
}

#[test]
fn identical_copy_elsewhere_is_stable() {
    let a = service_tree();
    let b = service_tree();
    assert_eq!(
        hash(a.path(), &["src", "common"]),
        hash(b.path(), &["src", "common"])
    );
}

#[test]
fn missing_package_fails_with_its_path() {
    let tree = service_tree();
    let req = BuildRequest::new(tree.path(), "Pipfile.lock", ["src", "missing"]);
    let err = compute_identity(&req).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedInput { .. }));
    assert!(err
        .to_string()
        .contains(&tree.path().join("missing").display().to_string()));
}
