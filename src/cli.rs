//! Command-line interface definitions

use crate::copy::CopyMethod;
use crate::scheduler::{FailurePolicy, Scheduler};
use crate::sync::SyncConfig;
use anyhow::{Context, Result};
use clap::Parser;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Periodically mirror a source directory onto a replica directory
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to mirror from
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory to mirror into; created if missing
    #[arg(value_name = "REPLICA")]
    pub replica: PathBuf,

    /// Seconds to wait between synchronization passes
    #[arg(value_name = "INTERVAL", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// File every action is appended to
    #[arg(value_name = "LOG_FILE")]
    pub log_file: PathBuf,

    /// Copy method to use
    #[arg(long, value_enum, default_value = "auto")]
    pub copy_method: CopyMethod,

    /// Log what would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Show a progress bar while applying each pass
    #[arg(long)]
    pub progress: bool,

    /// Exit when a pass fails instead of retrying at the next interval
    ///
    /// A pass fails as a whole when a root directory cannot be read or the
    /// log file cannot be written. Failures on single files never stop the
    /// scheduler.
    #[arg(long)]
    pub abort_on_error: bool,

    /// Stop after this many passes (default: run until killed)
    #[arg(long, value_name = "N")]
    pub passes: Option<NonZeroU64>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all diagnostics except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Best-effort absolute form of `path`, resolving symlinks where it exists
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => resolve(parent).join(name),
        _ => path.to_path_buf(),
    }
}

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Both --quiet and --verbose options are used
    /// - The source is not an existing directory
    /// - The replica is the source, or one is nested inside the other
    /// - The log file would live inside the replica
    pub fn validate(&self) -> Result<()> {
        if self.quiet && self.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        if !self.source.exists() {
            anyhow::bail!("Source directory does not exist: {}", self.source.display());
        }
        if !self.source.is_dir() {
            anyhow::bail!("Source must be a directory: {}", self.source.display());
        }
        if self.replica.exists() && !self.replica.is_dir() {
            anyhow::bail!("Replica must be a directory: {}", self.replica.display());
        }

        let source = resolve(&self.source);
        let replica = resolve(&self.replica);
        if source == replica {
            anyhow::bail!("Source and replica are the same directory: {}", source.display());
        }
        if replica.starts_with(&source) || source.starts_with(&replica) {
            anyhow::bail!(
                "Source and replica must not be nested: {} and {}",
                source.display(),
                replica.display()
            );
        }

        if resolve(&self.log_file).starts_with(&replica) {
            anyhow::bail!(
                "Log file must not be inside the replica: {}",
                self.log_file.display()
            );
        }

        Ok(())
    }

    /// Create the replica root if it does not exist yet
    ///
    /// Skipped in dry-run mode, which never touches the replica.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn prepare_replica(&self) -> Result<()> {
        if self.dry_run || self.replica.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.replica).with_context(|| {
            format!("Failed to create replica directory {}", self.replica.display())
        })
    }

    /// Interval between passes
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Pass settings derived from the arguments
    #[must_use]
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            source_root: self.source.clone(),
            replica_root: self.replica.clone(),
            copy_method: self.copy_method,
            dry_run: self.dry_run,
            show_progress: self.progress && !self.quiet,
        }
    }

    /// Scheduler derived from the arguments
    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        let policy = if self.abort_on_error {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Retry
        };
        Scheduler::new(self.interval())
            .with_max_passes(self.passes)
            .with_policy(policy)
    }
}
