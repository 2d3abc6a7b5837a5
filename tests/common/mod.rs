//! Common helpers for integration tests

#![allow(dead_code)]

use mirrorsync::fingerprint::{fingerprint, Fingerprint};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Source and replica roots side by side in one temp directory
pub struct TestTrees {
    pub temp: TempDir,
    pub source: PathBuf,
    pub replica: PathBuf,
}

impl TestTrees {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let replica = temp.path().join("replica");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&replica).unwrap();
        Self {
            temp,
            source,
            replica,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.temp.path().join("sync.log")
    }
}

/// Write `content` at `root/path`, creating parent directories
pub fn write_file(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(full, content).unwrap();
}

/// Create the directory `root/path` and its parents
pub fn make_dir(root: &Path, path: &str) {
    fs::create_dir_all(root.join(path)).unwrap();
}

/// Every relative path under `root`, with a fingerprint for files and
/// `None` for directories
pub fn tree_state(root: &Path) -> BTreeMap<String, Option<Fingerprint>> {
    let mut state = BTreeMap::new();
    for entry in walkdir::WalkDir::new(root).min_depth(1) {
        let entry = entry.unwrap();
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        let fp = if entry.file_type().is_file() {
            Some(fingerprint(entry.path()).unwrap())
        } else {
            None
        };
        state.insert(rel, fp);
    }
    state
}

/// Assert that the replica holds exactly the source's paths and contents
pub fn assert_converged(trees: &TestTrees) {
    assert_eq!(
        tree_state(&trees.replica),
        tree_state(&trees.source),
        "replica does not match source"
    );
}

/// A mixed tree exercising nesting, empty directories, and several sizes
pub fn populate_source(root: &Path) {
    write_file(root, "small_file.txt", "small");
    write_file(root, "subdir1/file.txt", "one");
    write_file(root, "subdir1/nested/deep.txt", "deep");
    write_file(root, "subdir2/another.bin", &"x".repeat(200_000));
    make_dir(root, "empty_dir");
}
