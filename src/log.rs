//! Action log: timestamped records of every mutation, mirrored to sinks
//!
//! Each record renders as one line, `[YYYY-MM-DD HH:MM:SS] <message>`, in
//! local time. Records go to every sink of an [`ActionLog`], normally the
//! append-only log file and standard output.

use crate::diff::{Action, ActionKind};
use crate::error::{Result, SyncError};
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Timestamp layout used at the start of every line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Marker written when a pass starts
pub const PASS_STARTED: &str = "Starting synchronization";

/// Marker written when a pass ends
pub const PASS_COMPLETED: &str = "Synchronization completed";

/// One line of the action log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// When the record was produced
    pub timestamp: DateTime<Local>,
    /// Human-readable description
    pub message: String,
}

impl LogRecord {
    /// Record stamped with the current local time
    #[must_use]
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    /// Record describing `action` against concrete roots
    #[must_use]
    pub fn for_action(action: &Action, source_root: &Path, replica_root: &Path) -> Self {
        Self::now(describe(action, source_root, replica_root))
    }

    /// Record for an action that failed
    #[must_use]
    pub fn failure(
        action: &Action,
        source_root: &Path,
        replica_root: &Path,
        error: &SyncError,
    ) -> Self {
        Self::now(format!(
            "Failed: {} ({})",
            describe(action, source_root, replica_root),
            error
        ))
    }

    /// Record for a problem not tied to one planned action
    #[must_use]
    pub fn error(error: &SyncError) -> Self {
        Self::now(format!("Error: {error}"))
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Human phrase for an action, e.g. `Copying /src/a to /replica/a`
#[must_use]
pub fn describe(action: &Action, source_root: &Path, replica_root: &Path) -> String {
    let replica = action.replica_path(replica_root);
    let source = action.path.under(source_root);
    match action.kind {
        ActionKind::CreateDir => format!(
            "Copying directory {} to {}",
            source.display(),
            replica.display()
        ),
        ActionKind::CopyFile => format!("Copying {} to {}", source.display(), replica.display()),
        ActionKind::UpdateFile => format!("Updating {}", replica.display()),
        ActionKind::DeleteFile => format!("Deleting {}", replica.display()),
        ActionKind::DeleteDir => format!("Deleting directory {}", replica.display()),
    }
}

/// Destination for action log records
pub trait LogSink {
    /// Write one record
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LogSink`] if the record cannot be written.
    fn write_record(&mut self, record: &LogRecord) -> Result<()>;
}

/// Append-only log file
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open `path` for appending, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LogSink`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SyncError::LogSink {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }
}

impl LogSink for FileSink {
    fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        writeln!(self.file, "{record}")
            .and_then(|()| self.file.flush())
            .map_err(|source| SyncError::LogSink {
                path: self.path.clone(),
                source,
            })
    }
}

/// Standard output
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{record}")
            .and_then(|()| stdout.flush())
            .map_err(|source| SyncError::LogSink {
                path: PathBuf::from("<stdout>"),
                source,
            })
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Records in the order written
    pub records: Vec<LogRecord>,
}

impl MemorySink {
    /// Messages without timestamps
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.message.as_str()).collect()
    }
}

impl LogSink for MemorySink {
    fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Fans each record out to several sinks
#[derive(Default)]
pub struct ActionLog {
    sinks: Vec<Box<dyn LogSink>>,
}

impl ActionLog {
    /// Log with no sinks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink; records reach sinks in the order they were added
    #[must_use]
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Log file plus standard output
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::LogSink`] if the log file cannot be opened.
    pub fn file_and_console(path: &Path) -> Result<Self> {
        Ok(Self::new()
            .with_sink(FileSink::open(path)?)
            .with_sink(ConsoleSink))
    }
}

impl LogSink for ActionLog {
    fn write_record(&mut self, record: &LogRecord) -> Result<()> {
        for sink in &mut self.sinks {
            sink.write_record(record)?;
        }
        Ok(())
    }
}
