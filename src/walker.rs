//! Tree walking and snapshots
//!
//! A [`Snapshot`] is the full pre-order listing of one tree at the start of
//! a pass. Directories always precede their descendants, and siblings are
//! sorted by name so two walks of the same tree yield the same order.
//!
//! Symbolic links and special files (sockets, FIFOs, devices) are never
//! followed. They are recorded as [`EntryKind::Other`] so the replica side
//! can get rid of them; they are never mirrored from the source.

use crate::error::{Result, SyncError};
use crate::path::RelativePath;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Directory
    Directory,
    /// Regular file
    File,
    /// Symbolic link or special file
    Other,
}

/// One node of a tree snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path relative to the snapshot root
    pub path: RelativePath,
    /// Whether the entry is a file or a directory
    pub kind: EntryKind,
}

impl Entry {
    /// Directory entry
    #[must_use]
    pub const fn directory(path: RelativePath) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
        }
    }

    /// File entry
    #[must_use]
    pub const fn file(path: RelativePath) -> Self {
        Self {
            path,
            kind: EntryKind::File,
        }
    }

    /// Symbolic link or special file entry
    #[must_use]
    pub const fn other(path: RelativePath) -> Self {
        Self {
            path,
            kind: EntryKind::Other,
        }
    }

    /// Whether this is a directory entry
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Pre-order listing of one directory tree
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: PathBuf,
    entries: Vec<Entry>,
    unreadable: Vec<RelativePath>,
}

impl Snapshot {
    /// Build a snapshot from entries that are already in pre-order
    #[must_use]
    pub fn from_entries(root: impl Into<PathBuf>, entries: Vec<Entry>) -> Self {
        Self {
            root: root.into(),
            entries,
            unreadable: Vec::new(),
        }
    }

    /// Root the entries are relative to
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries in walk order
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Directories below the root that could not be listed
    #[must_use]
    pub fn unreadable(&self) -> &[RelativePath] {
        &self.unreadable
    }

    /// Mark a directory as unlisted so nothing beneath it is treated as absent
    pub fn mark_unreadable(&mut self, path: RelativePath) {
        self.unreadable.push(path);
    }

    /// Whether `path` lies in (or is) a directory that could not be listed
    #[must_use]
    pub fn is_unreadable(&self, path: &RelativePath) -> bool {
        self.unreadable.iter().any(|dir| path.starts_with(dir))
    }

    /// Index entry kinds by relative path
    #[must_use]
    pub fn lookup(&self) -> HashMap<&RelativePath, EntryKind> {
        self.entries.iter().map(|e| (&e.path, e.kind)).collect()
    }

    /// Number of entries, excluding the root
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries below its root
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walk `root` recursively and record every file and directory beneath it
///
/// # Errors
///
/// Returns [`SyncError::RootUnavailable`] if `root` does not exist, is not a
/// directory, or cannot be listed. Failures to list a directory further down
/// are not fatal: the directory is recorded in [`Snapshot::unreadable`].
pub fn walk(root: &Path) -> Result<Snapshot> {
    let metadata = fs::metadata(root).map_err(|e| SyncError::root(root, e))?;
    if !metadata.is_dir() {
        return Err(SyncError::root(
            root,
            io::Error::new(io::ErrorKind::Other, "not a directory"),
        ));
    }

    let mut snapshot = Snapshot::from_entries(root, Vec::new());

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                let depth = err.depth();
                let failed = err.path().map(Path::to_path_buf);
                if depth == 0 {
                    return Err(SyncError::root(root, io::Error::from(err)));
                }
                match failed.as_deref().and_then(|p| RelativePath::relative_of(root, p)) {
                    Some(rel) => {
                        warn!("Cannot list {} under {}: {}", rel, root.display(), err);
                        snapshot.mark_unreadable(rel);
                    }
                    None => warn!("Skipping unreadable entry under {}: {}", root.display(), err),
                }
                continue;
            }
        };

        let Some(rel) = RelativePath::relative_of(root, entry.path()) else {
            continue;
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            snapshot.entries.push(Entry::directory(rel));
        } else if file_type.is_file() {
            snapshot.entries.push(Entry::file(rel));
        } else {
            debug!("Not following non-regular entry: {}", entry.path().display());
            snapshot.entries.push(Entry::other(rel));
        }
    }

    debug!(
        "Walked {}: {} entries, {} unreadable",
        root.display(),
        snapshot.len(),
        snapshot.unreadable.len()
    );

    Ok(snapshot)
}
