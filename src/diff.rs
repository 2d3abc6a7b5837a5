//! Tree differ: turns a source and a replica snapshot into an action plan
//!
//! The plan converges the replica onto the source in two phases:
//!
//! 1. **Creation phase**, walking the source snapshot in pre-order:
//!    missing directories become a single [`ActionKind::CreateDir`] that
//!    copies the whole subtree, so nothing beneath them is diffed again;
//!    missing files become [`ActionKind::CopyFile`]; files whose content
//!    fingerprints differ become [`ActionKind::UpdateFile`].
//! 2. **Deletion phase**, walking the replica snapshot in pre-order:
//!    directories absent from the source become one recursive
//!    [`ActionKind::DeleteDir`] and their descendants are skipped; files
//!    absent from the source become [`ActionKind::DeleteFile`].
//!
//! When a path is a file on one side and a directory on the other, the
//! replica entry is removed in the creation phase immediately before its
//! replacement is created, and the deletion phase leaves that path alone.
//! Symlinks and special files are never mirrored: on the source side they
//! are ignored, on the replica side they are always unlinked with
//! [`ActionKind::DeleteFile`], before anything is written at their path.
//!
//! Replica entries under a source directory that could not be listed are
//! never deleted.

use crate::error::SyncError;
use crate::fingerprint::Fingerprinter;
use crate::path::RelativePath;
use crate::walker::{EntryKind, Snapshot};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Kind of filesystem mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Copy a whole source directory subtree into the replica
    CreateDir,
    /// Copy a source file that the replica lacks
    CopyFile,
    /// Overwrite a replica file whose content differs from the source
    UpdateFile,
    /// Remove a replica file absent from the source
    DeleteFile,
    /// Recursively remove a replica directory absent from the source
    DeleteDir,
}

impl ActionKind {
    /// Whether the action removes something from the replica
    #[must_use]
    pub const fn is_deletion(self) -> bool {
        matches!(self, Self::DeleteFile | Self::DeleteDir)
    }

    /// Whether the action reads from the source tree
    #[must_use]
    pub const fn reads_source(self) -> bool {
        matches!(self, Self::CreateDir | Self::CopyFile | Self::UpdateFile)
    }
}

/// One planned mutation of the replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// What to do
    pub kind: ActionKind,
    /// Where, relative to both roots
    pub path: RelativePath,
}

impl Action {
    /// Build an action of `kind` on `path`
    #[must_use]
    pub const fn new(kind: ActionKind, path: RelativePath) -> Self {
        Self { kind, path }
    }

    /// Source-side path, for actions that copy from the source
    #[must_use]
    pub fn source_path(&self, source_root: &Path) -> Option<PathBuf> {
        self.kind
            .reads_source()
            .then(|| self.path.under(source_root))
    }

    /// Replica-side path the action mutates
    #[must_use]
    pub fn replica_path(&self, replica_root: &Path) -> PathBuf {
        self.path.under(replica_root)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ActionKind::CreateDir | ActionKind::DeleteDir => {
                write!(f, "{:?} {}/", self.kind, self.path)
            }
            _ => write!(f, "{:?} {}", self.kind, self.path),
        }
    }
}

/// A source file left out of the plan because it could not be fingerprinted
#[derive(Debug)]
pub struct SkippedFile {
    /// Path relative to both roots
    pub path: RelativePath,
    /// Why it was skipped
    pub error: SyncError,
}

/// Ordered actions for one pass, plus the files that could not be compared
#[derive(Debug, Default)]
pub struct Plan {
    /// Actions in application order
    pub actions: Vec<Action>,
    /// Source files skipped this pass
    pub skipped: Vec<SkippedFile>,
}

impl Plan {
    /// Whether the pass has nothing to do
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of planned actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    fn push(&mut self, kind: ActionKind, path: &RelativePath) {
        let action = Action::new(kind, path.clone());
        debug!("Planned: {}", action);
        self.actions.push(action);
    }
}

/// Whether a proper ancestor of `path` is in `dirs`
fn covered_by(path: &RelativePath, dirs: &HashSet<RelativePath>) -> bool {
    !dirs.is_empty() && path.ancestors().any(|ancestor| dirs.contains(&ancestor))
}

/// Compute the ordered action plan that converges `replica` onto `source`
///
/// Fingerprint failures never abort the diff: a source file that cannot be
/// read is recorded in [`Plan::skipped`], and a replica file that cannot be
/// read is scheduled for [`ActionKind::UpdateFile`].
pub fn diff<F>(source: &Snapshot, replica: &Snapshot, fingerprinter: &F) -> Plan
where
    F: Fingerprinter + ?Sized,
{
    let mut plan = Plan::default();
    let replica_lookup = replica.lookup();

    // Directories copied wholesale by CreateDir this pass
    let mut created: HashSet<RelativePath> = HashSet::new();
    // Replica paths removed early to make room for an entry of another kind
    let mut replaced: HashSet<RelativePath> = HashSet::new();

    for entry in source.entries() {
        if covered_by(&entry.path, &created) {
            continue;
        }

        match (entry.kind, replica_lookup.get(&entry.path).copied()) {
            (EntryKind::Other, _) => {}
            (EntryKind::Directory, None) => {
                plan.push(ActionKind::CreateDir, &entry.path);
                created.insert(entry.path.clone());
            }
            (EntryKind::Directory, Some(EntryKind::Directory)) => {}
            (EntryKind::Directory, Some(EntryKind::File | EntryKind::Other)) => {
                plan.push(ActionKind::DeleteFile, &entry.path);
                replaced.insert(entry.path.clone());
                plan.push(ActionKind::CreateDir, &entry.path);
                created.insert(entry.path.clone());
            }
            (EntryKind::File, None) => plan.push(ActionKind::CopyFile, &entry.path),
            (EntryKind::File, Some(EntryKind::Directory)) => {
                plan.push(ActionKind::DeleteDir, &entry.path);
                replaced.insert(entry.path.clone());
                plan.push(ActionKind::CopyFile, &entry.path);
            }
            (EntryKind::File, Some(EntryKind::Other)) => {
                plan.push(ActionKind::DeleteFile, &entry.path);
                replaced.insert(entry.path.clone());
                plan.push(ActionKind::CopyFile, &entry.path);
            }
            (EntryKind::File, Some(EntryKind::File)) => {
                compare_files(source.root(), replica.root(), &entry.path, fingerprinter, &mut plan);
            }
        }
    }

    let source_lookup = source.lookup();
    let mut deleted: HashSet<RelativePath> = HashSet::new();

    for entry in replica.entries() {
        if replaced.contains(&entry.path) {
            if entry.is_dir() {
                deleted.insert(entry.path.clone());
            }
            continue;
        }
        if covered_by(&entry.path, &deleted) {
            continue;
        }
        if entry.kind != EntryKind::Other && source_lookup.get(&entry.path) == Some(&entry.kind) {
            continue;
        }
        if source.is_unreadable(&entry.path) {
            debug!("Keeping {}: source side could not be listed", entry.path);
            continue;
        }

        if entry.is_dir() {
            plan.push(ActionKind::DeleteDir, &entry.path);
            deleted.insert(entry.path.clone());
        } else {
            plan.push(ActionKind::DeleteFile, &entry.path);
        }
    }

    plan
}

fn compare_files<F>(
    source_root: &Path,
    replica_root: &Path,
    path: &RelativePath,
    fingerprinter: &F,
    plan: &mut Plan,
) where
    F: Fingerprinter + ?Sized,
{
    let source_fp = match fingerprinter.fingerprint(&path.under(source_root)) {
        Ok(fp) => fp,
        Err(error) => {
            warn!("Skipping {} this pass: {}", path, error);
            plan.skipped.push(SkippedFile {
                path: path.clone(),
                error,
            });
            return;
        }
    };

    match fingerprinter.fingerprint(&path.under(replica_root)) {
        Ok(replica_fp) if replica_fp == source_fp => {}
        Ok(_) => plan.push(ActionKind::UpdateFile, path),
        Err(error) => {
            warn!("Cannot read replica copy of {}, overwriting: {}", path, error);
            plan.push(ActionKind::UpdateFile, path);
        }
    }
}
