//! Content fingerprints for change detection
//!
//! Files are compared by an MD5 digest of their full byte content, never by
//! timestamps or size. The digest is folded from fixed-size chunks so memory
//! use does not depend on file size.

use crate::error::{Result, SyncError};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Chunk size used when streaming a file through the digest
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Digest of a file's full byte content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Fingerprint an in-memory byte slice
    #[must_use]
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(md5::compute(data).into())
    }

    /// Raw digest bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Source of file fingerprints used by the differ
pub trait Fingerprinter {
    /// Fingerprint the file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or fails mid-read.
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint>;
}

/// Streams files from disk through MD5
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Fingerprinter;

impl Fingerprinter for Md5Fingerprinter {
    fn fingerprint(&self, path: &Path) -> Result<Fingerprint> {
        fingerprint(path)
    }
}

/// Fingerprint the file at `path`, reading it in [`CHUNK_SIZE`] chunks
///
/// # Errors
///
/// Returns [`SyncError::Io`] (or [`SyncError::PermissionDenied`]) if the file
/// cannot be opened or a read fails part way through.
pub fn fingerprint(path: &Path) -> Result<Fingerprint> {
    let mut file = File::open(path).map_err(|e| SyncError::io("fingerprint", path, e))?;
    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SyncError::io("fingerprint", path, e)),
        };
        context.consume(&buffer[..bytes_read]);
    }

    Ok(Fingerprint(context.compute().into()))
}
