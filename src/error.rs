//! Error handling and types

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Synchronization and file operation errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// A tree root is missing, not a directory, or unreadable at walk time
    #[error("Root directory unavailable: {}: {source}", path.display())]
    RootUnavailable {
        /// Root that could not be walked
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// I/O failure on a single file or directory
    #[error("Failed to {op} {}: {source}", path.display())]
    Io {
        /// Operation being performed, e.g. "copy" or "fingerprint"
        op: &'static str,
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Permission denied on a single file or directory
    #[error("Permission denied: cannot {op} {}", path.display())]
    PermissionDenied {
        /// Operation being performed
        op: &'static str,
        /// Path the operation was applied to
        path: PathBuf,
    },

    /// The action log file cannot be opened or written
    #[error("Log sink {} unavailable: {source}", path.display())]
    LogSink {
        /// Log file path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Wrap an I/O error raised while performing `op` on `path`
    ///
    /// `PermissionDenied` errors are lifted into their own variant so callers
    /// can tell them apart without inspecting the source.
    #[must_use]
    pub fn io(op: &'static str, path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied {
                op,
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                op,
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Wrap an I/O error raised while opening or walking a tree root
    #[must_use]
    pub fn root(path: &Path, source: io::Error) -> Self {
        Self::RootUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this error aborts the whole pass rather than a single action
    #[must_use]
    pub const fn is_pass_fatal(&self) -> bool {
        matches!(
            self,
            Self::RootUnavailable { .. } | Self::LogSink { .. } | Self::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
