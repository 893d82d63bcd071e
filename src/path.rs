//! Canonical, absolute locations inside an archive.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// An immutable, absolute, `/`-separated location inside an [`Archive`](crate::Archive).
///
/// ### Construction rules
///
/// * An empty context resolves to the root `/`.
/// * A context that does not start with `/` is prefixed with it.
/// * A trailing `/` is kept verbatim (see [`get`](ArchivePath::get)) but ignored for equality,
///   hashing and ordering, so `/dir` and `/dir/` are the same key.
///
/// No other normalization happens: `.` and `..` are ordinary segment names here, and
/// `a//b` is not collapsed. Paths are opaque hierarchical strings, not host paths.
#[derive(Clone)]
pub struct ArchivePath {
    context: String,
}

impl ArchivePath {
    /// Creates a path from any string-like context.
    pub fn new<S: AsRef<str>>(context: S) -> Self {
        let context = context.as_ref();
        if context.is_empty() {
            return Self::root();
        }
        if context.starts_with(SEPARATOR) {
            Self {
                context: context.to_string(),
            }
        } else {
            Self {
                context: format!("{SEPARATOR}{context}"),
            }
        }
    }

    /// Returns the root path `/`.
    pub fn root() -> Self {
        Self {
            context: SEPARATOR.to_string(),
        }
    }

    /// Returns the context exactly as it was given (absolute, trailing separator preserved).
    pub fn get(&self) -> &str {
        &self.context
    }

    /// Returns the canonical form: absolute, without trailing separators.
    pub fn as_str(&self) -> &str {
        let trimmed = self.context.trim_end_matches(SEPARATOR);
        if trimmed.is_empty() { "/" } else { trimmed }
    }

    /// Canonical form without the leading separator; empty for the root.
    /// Used as the entry name inside container formats.
    pub fn relative(&self) -> &str {
        &self.as_str()[1..]
    }

    pub fn is_root(&self) -> bool {
        self.as_str() == "/"
    }

    /// Whether the verbatim context ends with a separator (directory-style display).
    pub fn is_directory_form(&self) -> bool {
        !self.is_root() && self.context.ends_with(SEPARATOR)
    }

    /// Composes `self` with a child context.
    ///
    /// ```
    /// use archive_kit::ArchivePath;
    ///
    /// let base = ArchivePath::new("base");
    /// assert_eq!(base.join("context").get(), "/base/context");
    /// assert_eq!(ArchivePath::new("/dir/").join("/file").get(), "/dir/file");
    /// ```
    pub fn join<P: Into<ArchivePath>>(&self, child: P) -> ArchivePath {
        let child = child.into();
        if self.is_root() {
            return child;
        }
        if child.is_root() {
            return ArchivePath::new(self.as_str());
        }
        ArchivePath {
            context: format!("{}{}", self.as_str(), child.get()),
        }
    }

    /// Returns the last segment; empty for the root.
    pub fn name(&self) -> &str {
        let canonical = self.as_str();
        match canonical.rfind(SEPARATOR) {
            Some(idx) => &canonical[idx + 1..],
            None => canonical,
        }
    }

    /// Returns the parent path, `None` for the root.
    pub fn parent(&self) -> Option<ArchivePath> {
        if self.is_root() {
            return None;
        }
        let canonical = self.as_str();
        let idx = canonical.rfind(SEPARATOR)?;
        Some(ArchivePath::new(&canonical[..idx]))
    }

    /// Iterates over all proper ancestors, nearest first, ending with the root.
    pub fn ancestors(&self) -> impl Iterator<Item = ArchivePath> {
        std::iter::successors(self.parent(), |p| p.parent())
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.as_str().matches(SEPARATOR).count()
        }
    }

    /// Segment-wise prefix test: `/a/b` starts with `/a`, `/a/bc` does not start with `/a/b`.
    pub fn starts_with(&self, base: &ArchivePath) -> bool {
        self.strip_prefix(base).is_some()
    }

    /// Returns the remainder of `self` below `base`, rooted at `/`.
    /// `base` itself yields the root; an unrelated path yields `None`.
    pub fn strip_prefix(&self, base: &ArchivePath) -> Option<ArchivePath> {
        if base.is_root() {
            return Some(self.clone());
        }
        let own = self.get();
        let prefix = base.as_str();
        let rest = own.strip_prefix(prefix)?;
        if rest.is_empty() || rest.chars().all(|c| c == SEPARATOR) {
            return Some(ArchivePath::root());
        }
        if rest.starts_with(SEPARATOR) {
            Some(ArchivePath::new(rest))
        } else {
            None
        }
    }
}

impl Default for ArchivePath {
    fn default() -> Self {
        Self::root()
    }
}

impl PartialEq for ArchivePath {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ArchivePath {}

impl Hash for ArchivePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for ArchivePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArchivePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.context)
    }
}

impl fmt::Debug for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchivePath({:?})", self.context)
    }
}

impl From<&str> for ArchivePath {
    fn from(value: &str) -> Self {
        ArchivePath::new(value)
    }
}

impl From<String> for ArchivePath {
    fn from(value: String) -> Self {
        ArchivePath::new(value)
    }
}

impl From<&String> for ArchivePath {
    fn from(value: &String) -> Self {
        ArchivePath::new(value)
    }
}

impl From<&ArchivePath> for ArchivePath {
    fn from(value: &ArchivePath) -> Self {
        value.clone()
    }
}
