//! File and subtree copying with attribute preservation
//!
//! Every copy carries the source's permission bits and its access and
//! modification times onto the replica, overwriting whatever is there.
//!
//! # Copy Methods
//!
//! - **auto**: the platform copy (`copy_file_range`/`sendfile` on Linux,
//!   `clonefile` where available), falling back to read/write on failure
//! - **read-write**: chunked buffered read/write, works everywhere
//!
//! # Usage
//!
//! ```rust,no_run
//! use mirrorsync::copy::{copy_file, CopyMethod};
//! use std::path::Path;
//!
//! let bytes = copy_file(Path::new("src.txt"), Path::new("dst.txt"), CopyMethod::Auto)?;
//! # Ok::<(), mirrorsync::SyncError>(())
//! ```

use crate::error::{Result, SyncError};
use filetime::FileTime;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Buffer size for the read/write fallback
const BUFFER_SIZE: usize = 64 * 1024;

/// How file bytes are moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CopyMethod {
    /// Use the platform's native file copy, falling back to read/write
    #[default]
    Auto,
    /// Use traditional buffered read/write operations
    ReadWrite,
}

/// Statistics for one subtree copy
#[derive(Debug, Default)]
pub struct TreeCopyStats {
    /// Files copied
    pub files_copied: u64,
    /// Directories created, including the subtree root
    pub directories_created: u64,
    /// Bytes copied
    pub bytes_copied: u64,
    /// Entries inside the subtree that failed to copy
    pub failures: Vec<SyncError>,
}

/// Copy a single file with its permissions and timestamps
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns an error if the source cannot be read or the destination cannot
/// be written. Failure to carry timestamps over is logged, not returned.
pub fn copy_file(src: &Path, dst: &Path, method: CopyMethod) -> Result<u64> {
    let metadata = fs::metadata(src).map_err(|e| SyncError::io("read metadata of", src, e))?;

    let bytes = match method {
        CopyMethod::Auto => match fs::copy(src, dst) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(SyncError::io("copy", src, e));
            }
            Err(e) => {
                debug!("native copy failed: {}, falling back to read/write", e);
                copy_read_write(src, dst, &metadata)?
            }
        },
        CopyMethod::ReadWrite => copy_read_write(src, dst, &metadata)?,
    };

    if let Err(e) = preserve_times(&metadata, dst) {
        warn!("Failed to preserve timestamps for {}: {}", dst.display(), e);
    }

    Ok(bytes)
}

/// Copy file bytes through a fixed-size buffer, then apply permissions
fn copy_read_write(src: &Path, dst: &Path, metadata: &Metadata) -> Result<u64> {
    let mut src_file = File::open(src).map_err(|e| SyncError::io("open", src, e))?;
    let mut dst_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dst)
        .map_err(|e| SyncError::io("open", dst, e))?;

    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_copied = 0u64;

    loop {
        let bytes_read = match src_file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SyncError::io("read", src, e)),
        };
        dst_file
            .write_all(&buffer[..bytes_read])
            .map_err(|e| SyncError::io("write", dst, e))?;
        total_copied += bytes_read as u64;
    }

    dst_file
        .sync_all()
        .map_err(|e| SyncError::io("sync", dst, e))?;

    fs::set_permissions(dst, metadata.permissions())
        .map_err(|e| SyncError::io("set permissions on", dst, e))?;

    debug!("read/write: copied {} bytes to {}", total_copied, dst.display());
    Ok(total_copied)
}

/// Carry access and modification times from `metadata` onto `dst`
fn preserve_times(metadata: &Metadata, dst: &Path) -> Result<()> {
    let atime = FileTime::from_last_access_time(metadata);
    let mtime = FileTime::from_last_modification_time(metadata);
    filetime::set_file_times(dst, atime, mtime)
        .map_err(|e| SyncError::io("set timestamps on", dst, e))
}

/// Recursively copy the directory `src` to `dst`
///
/// Copies whatever exists under `src` at call time. Symbolic links and
/// special files are skipped, matching what the tree walker records.
/// Failures on individual entries inside the subtree are collected in
/// [`TreeCopyStats::failures`] and do not stop the rest of the copy.
///
/// # Errors
///
/// Returns an error only if `dst` itself cannot be created or `src` cannot
/// be listed at all.
pub fn copy_tree(src: &Path, dst: &Path, method: CopyMethod) -> Result<TreeCopyStats> {
    let mut stats = TreeCopyStats::default();
    let mut directories = Vec::new();

    for item in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(SyncError::io("list", src, std::io::Error::from(err)));
            }
            Err(err) => {
                let path = err.path().unwrap_or(src).to_path_buf();
                warn!("Failed to list {}: {}", path.display(), err);
                stats
                    .failures
                    .push(SyncError::io("list", &path, std::io::Error::from(err)));
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if entry.depth() == 0 {
                fs::create_dir_all(&target)
                    .map_err(|e| SyncError::io("create directory", &target, e))?;
                stats.directories_created += 1;
            } else {
                match fs::create_dir(&target) {
                    Ok(()) => stats.directories_created += 1,
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                    Err(e) => {
                        warn!("Failed to create directory {}: {}", target.display(), e);
                        stats.failures.push(SyncError::io("create directory", &target, e));
                        continue;
                    }
                }
            }
            directories.push((entry.path().to_path_buf(), target));
        } else if file_type.is_file() {
            match copy_file(entry.path(), &target, method) {
                Ok(bytes) => {
                    stats.files_copied += 1;
                    stats.bytes_copied += bytes;
                }
                Err(e) => {
                    warn!("Failed to copy file {}: {}", entry.path().display(), e);
                    stats.failures.push(e);
                }
            }
        } else {
            debug!("Skipping non-regular entry: {}", entry.path().display());
        }
    }

    // Children first, so filling a directory does not disturb its restored times.
    for (source_dir, target_dir) in directories.iter().rev() {
        let result = fs::metadata(source_dir)
            .map_err(|e| SyncError::io("read metadata of", source_dir, e))
            .and_then(|metadata| {
                fs::set_permissions(target_dir, metadata.permissions())
                    .map_err(|e| SyncError::io("set permissions on", target_dir, e))?;
                preserve_times(&metadata, target_dir)
            });
        if let Err(e) = result {
            warn!(
                "Failed to preserve directory attributes for {}: {}",
                target_dir.display(),
                e
            );
        }
    }

    debug!(
        "Tree copy {} -> {}: {} files, {} directories, {} bytes, {} failures",
        src.display(),
        dst.display(),
        stats.files_copied,
        stats.directories_created,
        stats.bytes_copied,
        stats.failures.len()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case(CopyMethod::Auto)]
    #[case(CopyMethod::ReadWrite)]
    fn test_copy_file_content_and_mtime(#[case] method: CopyMethod) {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("source.txt");
        let dst = temp_dir.path().join("destination.txt");
        fs::write(&src, "Hello, World!").unwrap();
        let mtime = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, mtime).unwrap();

        let bytes = copy_file(&src, &dst, method).unwrap();

        assert_eq!(bytes, 13);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "Hello, World!");
        let dst_meta = fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&dst_meta), mtime);
    }

    #[rstest]
    #[case(CopyMethod::Auto)]
    #[case(CopyMethod::ReadWrite)]
    fn test_copy_file_overwrites_and_truncates(#[case] method: CopyMethod) {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("source.txt");
        let dst = temp_dir.path().join("destination.txt");
        fs::write(&src, "v2").unwrap();
        fs::write(&dst, "a much longer version one").unwrap();

        copy_file(&src, &dst, method).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "v2");
    }

    #[cfg(unix)]
    #[test]
    fn test_read_write_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("script.sh");
        let dst = temp_dir.path().join("script_copy.sh");
        fs::write(&src, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o750)).unwrap();

        copy_file(&src, &dst, CopyMethod::ReadWrite).unwrap();

        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let err = copy_file(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("dst"),
            CopyMethod::Auto,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }

    #[test]
    fn test_copy_tree_copies_nested_content() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("subdir1/nested")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("subdir1/nested/deep.txt"), "deep").unwrap();

        let dst = temp_dir.path().join("replica/src");
        let stats = copy_tree(&src, &dst, CopyMethod::Auto).unwrap();

        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.directories_created, 4);
        assert_eq!(stats.bytes_copied, 7);
        assert!(stats.failures.is_empty());
        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "top");
        assert_eq!(fs::read_to_string(dst.join("subdir1/nested/deep.txt")).unwrap(), "deep");
        assert!(dst.join("empty").is_dir());
    }

    #[test]
    fn test_copy_tree_restores_directory_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("inner")).unwrap();
        fs::write(src.join("inner/file.txt"), "x").unwrap();
        let mtime = FileTime::from_unix_time(1_500_000_000, 0);
        filetime::set_file_mtime(src.join("inner"), mtime).unwrap();

        let dst = temp_dir.path().join("dst");
        copy_tree(&src, &dst, CopyMethod::Auto).unwrap();

        let meta = fs::metadata(dst.join("inner")).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), mtime);
    }

    #[test]
    fn test_copy_tree_missing_source_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = copy_tree(
            &temp_dir.path().join("gone"),
            &temp_dir.path().join("dst"),
            CopyMethod::Auto,
        );
        assert!(result.is_err());
    }
}
