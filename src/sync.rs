//! Main synchronization logic
//!
//! One pass walks both trees, diffs them, and applies the resulting plan in
//! order, writing a record for every mutation:
//!
//! 1. **Start**: write the `Starting synchronization` marker
//! 2. **Walk**: snapshot the source and the replica
//! 3. **Diff**: compute the ordered action plan
//! 4. **Apply**: execute each action, logging success or failure
//! 5. **Completion**: write the `Synchronization completed` marker
//!
//! # Error Handling
//!
//! A root that cannot be walked, or a log sink that cannot be written, ends
//! the pass with an error. Everything else is per file: the failure is
//! logged and counted in [`PassSummary`], and the rest of the plan still runs.
//!
//! # Usage
//!
//! ```rust,no_run
//! use mirrorsync::log::ActionLog;
//! use mirrorsync::sync::{run_pass, SyncConfig};
//! use std::path::Path;
//!
//! let config = SyncConfig::new("/data/source", "/data/replica");
//! let mut log = ActionLog::file_and_console(Path::new("/var/log/mirrorsync.log"))?;
//! let summary = run_pass(&config, &mut log)?;
//! println!("{} actions applied", summary.actions_applied);
//! # Ok::<(), mirrorsync::SyncError>(())
//! ```

use crate::apply::Applier;
use crate::copy::CopyMethod;
use crate::diff::diff;
use crate::error::Result;
use crate::fingerprint::{Fingerprinter, Md5Fingerprinter};
use crate::log::{LogRecord, LogSink, PASS_COMPLETED, PASS_STARTED};
use crate::progress::ProgressTracker;
use crate::walker::walk;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Settings for a synchronization pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Tree to mirror from
    pub source_root: PathBuf,
    /// Tree to mirror into
    pub replica_root: PathBuf,
    /// How file bytes are copied
    pub copy_method: CopyMethod,
    /// Log the plan without applying it
    pub dry_run: bool,
    /// Draw a progress bar while applying
    pub show_progress: bool,
}

impl SyncConfig {
    /// Default settings for a pair of roots
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, replica_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            replica_root: replica_root.into(),
            copy_method: CopyMethod::Auto,
            dry_run: false,
            show_progress: false,
        }
    }
}

/// Statistics for one synchronization pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassSummary {
    /// Actions in the plan
    pub actions_planned: u64,
    /// Actions that completed
    pub actions_applied: u64,
    /// Actions that failed; `actions_applied + actions_failed == actions_planned`
    pub actions_failed: u64,
    /// Entries inside a copied subtree that failed while the action itself went through
    pub entries_failed: u64,
    /// Source files left out of the plan because they could not be read
    pub files_skipped: u64,
    /// Files written to the replica
    pub files_copied: u64,
    /// Bytes written to the replica
    pub bytes_copied: u64,
    /// Directories created in the replica
    pub directories_created: u64,
    /// Files or directory trees removed from the replica
    pub entries_deleted: u64,
    /// Wall time of the pass
    pub duration: Duration,
}

impl PassSummary {
    /// Whether the replica already matched the source
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.actions_planned == 0 && self.files_skipped == 0
    }

    /// Whether every planned action and every source file went through
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.actions_failed == 0 && self.entries_failed == 0 && self.files_skipped == 0
    }
}

/// Run one pass with MD5 content fingerprints
///
/// # Errors
///
/// Returns [`crate::SyncError::RootUnavailable`] if either root cannot be
/// walked and [`crate::SyncError::LogSink`] if a record cannot be written.
/// Per-file failures are logged and counted, not returned.
pub fn run_pass(config: &SyncConfig, log: &mut dyn LogSink) -> Result<PassSummary> {
    run_pass_with(config, log, &Md5Fingerprinter)
}

/// Run one pass with a caller-supplied fingerprinter
///
/// # Errors
///
/// Same as [`run_pass`].
pub fn run_pass_with<F>(
    config: &SyncConfig,
    log: &mut dyn LogSink,
    fingerprinter: &F,
) -> Result<PassSummary>
where
    F: Fingerprinter + ?Sized,
{
    let start_time = Instant::now();
    log.write_record(&LogRecord::now(PASS_STARTED))?;

    let source = walk(&config.source_root)?;
    let replica = walk(&config.replica_root)?;
    let plan = diff(&source, &replica, fingerprinter);

    let mut summary = PassSummary {
        actions_planned: plan.len() as u64,
        files_skipped: plan.skipped.len() as u64,
        ..PassSummary::default()
    };

    for skipped in &plan.skipped {
        log.write_record(&LogRecord::error(&skipped.error))?;
    }

    let applier = Applier::new(&config.source_root, &config.replica_root)
        .with_copy_method(config.copy_method)
        .with_dry_run(config.dry_run);

    let mut tracker = if config.show_progress && !plan.is_empty() {
        ProgressTracker::new(summary.actions_planned)
    } else {
        ProgressTracker::hidden()
    };

    for action in &plan.actions {
        match applier.apply(action) {
            Ok(applied) => {
                tracker.suspend(|| log.write_record(&applied.record))?;
                for failure in &applied.nested_failures {
                    warn!("{}", failure);
                    tracker.suspend(|| log.write_record(&LogRecord::error(failure)))?;
                }
                summary.actions_applied += 1;
                summary.entries_failed += applied.nested_failures.len() as u64;
                summary.files_copied += applied.stats.files_copied;
                summary.bytes_copied += applied.stats.bytes_copied;
                summary.directories_created += applied.stats.directories_created;
                summary.entries_deleted += applied.stats.entries_deleted;
                tracker.update(applied.stats.bytes_copied);
            }
            Err(e) => {
                warn!("Action {} failed: {}", action, e);
                let record =
                    LogRecord::failure(action, &config.source_root, &config.replica_root, &e);
                tracker.suspend(|| log.write_record(&record))?;
                summary.actions_failed += 1;
                tracker.update(0);
            }
        }
    }
    tracker.finish();

    log.write_record(&LogRecord::now(PASS_COMPLETED))?;
    summary.duration = start_time.elapsed();

    info!(
        "Pass finished in {:?}: {} planned, {} applied, {} failed, {} nested failures, {} skipped",
        summary.duration,
        summary.actions_planned,
        summary.actions_applied,
        summary.actions_failed,
        summary.entries_failed,
        summary.files_skipped
    );

    Ok(summary)
}
