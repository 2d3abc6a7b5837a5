//! mirrorsync: one-way periodic directory mirroring
//!
//! Each pass snapshots a source and a replica tree, diffs them by content
//! fingerprint, and applies the minimal ordered set of creates, copies,
//! updates, and deletes that makes the replica match the source. Every
//! mutation is recorded to an append-only action log.

pub mod apply;
pub mod cli;
pub mod copy;
pub mod diff;
pub mod error;
pub mod fingerprint;
pub mod log;
pub mod path;
pub mod progress;
pub mod scheduler;
pub mod sync;
pub mod walker;

// Re-export commonly used types
pub use diff::{diff, Action, ActionKind, Plan};
pub use error::{Result, SyncError};
pub use path::RelativePath;
pub use scheduler::{FailurePolicy, Scheduler};
pub use sync::{run_pass, PassSummary, SyncConfig};
pub use walker::{walk, Entry, EntryKind, Snapshot};
