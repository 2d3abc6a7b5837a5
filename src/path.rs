//! Root-relative paths used as the join key between source and replica
//!
//! A [`RelativePath`] is normalized at construction: it holds only plain
//! name components, so `a/b`, `a//b` and `./a/b` all produce the same value
//! and compare equal regardless of the platform separator.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A normalized path relative to a tree root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath {
    components: Vec<OsString>,
}

impl RelativePath {
    /// Build from a path that is already relative to some root
    ///
    /// Returns `None` for empty paths and for paths containing a root,
    /// a prefix, or `..`, none of which can name an entry inside a tree.
    #[must_use]
    pub fn from_relative(path: &Path) -> Option<Self> {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => components.push(name.to_os_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        if components.is_empty() {
            None
        } else {
            Some(Self { components })
        }
    }

    /// Compute the path of `full` relative to `root`
    #[must_use]
    pub fn relative_of(root: &Path, full: &Path) -> Option<Self> {
        full.strip_prefix(root).ok().and_then(Self::from_relative)
    }

    /// Parse a `/`-separated path, mainly for building plans by hand
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::from_relative(Path::new(&s.replace('\\', "/")))
    }

    /// Append a single name component
    #[must_use]
    pub fn join(&self, name: impl AsRef<OsStr>) -> Self {
        let mut components = self.components.clone();
        components.push(name.as_ref().to_os_string());
        Self { components }
    }

    /// Resolve this path under a concrete tree root
    #[must_use]
    pub fn under(&self, root: &Path) -> PathBuf {
        let mut full = root.to_path_buf();
        full.extend(&self.components);
        full
    }

    /// Parent path, or `None` for a top-level entry
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.components.len() > 1 {
            Some(Self {
                components: self.components[..self.components.len() - 1].to_vec(),
            })
        } else {
            None
        }
    }

    /// Proper ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = Self> + '_ {
        (1..self.components.len()).rev().map(|len| Self {
            components: self.components[..len].to_vec(),
        })
    }

    /// Whether `ancestor` is this path or one of its ancestors
    #[must_use]
    pub fn starts_with(&self, ancestor: &Self) -> bool {
        self.components.starts_with(&ancestor.components)
    }

    /// Number of components; top-level entries have depth 1
    #[must_use]
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Final component
    #[must_use]
    pub fn file_name(&self) -> &OsStr {
        // Never empty: every constructor rejects empty component lists.
        self.components
            .last()
            .map_or_else(|| OsStr::new(""), OsString::as_os_str)
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", component.to_string_lossy())?;
        }
        Ok(())
    }
}
