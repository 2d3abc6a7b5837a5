//! Action applier: executes planned actions against the replica

use crate::copy::{copy_file, copy_tree, CopyMethod};
use crate::diff::{Action, ActionKind};
use crate::error::{Result, SyncError};
use crate::log::LogRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Counters produced by one applied action
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyStats {
    /// Files written to the replica
    pub files_copied: u64,
    /// Bytes written to the replica
    pub bytes_copied: u64,
    /// Directories created in the replica
    pub directories_created: u64,
    /// Files or directory trees removed from the replica
    pub entries_deleted: u64,
}

/// Outcome of a successfully applied action
#[derive(Debug)]
pub struct Applied {
    /// Log line for the action, stamped when execution started
    pub record: LogRecord,
    /// What the action did
    pub stats: ApplyStats,
    /// Entries inside a copied subtree that could not be copied
    pub nested_failures: Vec<SyncError>,
}

/// Executes actions between a fixed source and replica root
#[derive(Debug, Clone)]
pub struct Applier {
    source_root: PathBuf,
    replica_root: PathBuf,
    copy_method: CopyMethod,
    dry_run: bool,
}

impl Applier {
    /// Applier for the given roots
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, replica_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            replica_root: replica_root.into(),
            copy_method: CopyMethod::Auto,
            dry_run: false,
        }
    }

    /// Select how file bytes are copied
    #[must_use]
    pub fn with_copy_method(mut self, copy_method: CopyMethod) -> Self {
        self.copy_method = copy_method;
        self
    }

    /// Log actions without touching the filesystem
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Source root
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Replica root
    #[must_use]
    pub fn replica_root(&self) -> &Path {
        &self.replica_root
    }

    /// Execute one action
    ///
    /// # Errors
    ///
    /// Returns the I/O or permission error that prevented the action. The
    /// replica may be left partially changed for `CreateDir` and `DeleteDir`.
    pub fn apply(&self, action: &Action) -> Result<Applied> {
        let mut record = LogRecord::for_action(action, &self.source_root, &self.replica_root);

        if self.dry_run {
            record.message.push_str(" (dry run)");
            return Ok(Applied {
                record,
                stats: ApplyStats::default(),
                nested_failures: Vec::new(),
            });
        }

        let source = action.path.under(&self.source_root);
        let replica = action.replica_path(&self.replica_root);
        let mut stats = ApplyStats::default();
        let mut nested_failures = Vec::new();

        debug!("Applying {}", action);

        match action.kind {
            ActionKind::CreateDir => {
                let tree = copy_tree(&source, &replica, self.copy_method)?;
                stats.files_copied = tree.files_copied;
                stats.bytes_copied = tree.bytes_copied;
                stats.directories_created = tree.directories_created;
                nested_failures = tree.failures;
            }
            ActionKind::CopyFile | ActionKind::UpdateFile => {
                stats.bytes_copied = copy_file(&source, &replica, self.copy_method)?;
                stats.files_copied = 1;
            }
            ActionKind::DeleteFile => {
                fs::remove_file(&replica).map_err(|e| SyncError::io("delete", &replica, e))?;
                stats.entries_deleted = 1;
            }
            ActionKind::DeleteDir => {
                fs::remove_dir_all(&replica)
                    .map_err(|e| SyncError::io("delete directory", &replica, e))?;
                stats.entries_deleted = 1;
            }
        }

        Ok(Applied {
            record,
            stats,
            nested_failures,
        })
    }
}
