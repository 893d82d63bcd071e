use std::fmt;
use std::io::Read;

use crate::ArchivePath;
use crate::codec::ArchiveFormat;
use crate::fs::{DirectoryStream, FileAttributes};

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Boxed cause carried by codec failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CodecOp {
    Import,
    Export,
}

impl fmt::Display for CodecOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecOp::Import => f.write_str("import"),
            CodecOp::Export => f.write_str("export"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("illegal archive path {path}: {reason}")]
    IllegalPath { path: ArchivePath, reason: String },
    #[error("{op} of {format} archive failed at entry '{entry}'")]
    Codec {
        op: CodecOp,
        format: ArchiveFormat,
        entry: String,
        #[source]
        source: BoxError,
    },
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("{0} does not exist")]
    NotFound(ArchivePath),
    #[error("{0} is a directory")]
    IsADirectory(ArchivePath),
    #[error("{0} not a directory")]
    NotADirectory(ArchivePath),
    #[error("path already exists: {0}")]
    AlreadyExists(ArchivePath),
    #[error("resource '{0}' not found on the search path")]
    ResourceNotFound(String),
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("asset source error: {0}")]
    Source(#[from] anyhow::Error),
}

impl ArchiveError {
    pub(crate) fn illegal<S: Into<String>>(path: &ArchivePath, reason: S) -> Self {
        ArchiveError::IllegalPath {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    pub(crate) fn codec<E: Into<BoxError>>(
        op: CodecOp,
        format: ArchiveFormat,
        entry: impl Into<String>,
        source: E,
    ) -> Self {
        ArchiveError::Codec {
            op,
            format,
            entry: entry.into(),
            source: source.into(),
        }
    }
}

/// Filesystem-like view over an archive.
///
/// Paths are `/`-separated strings, absolute or relative to [`cwd`](FsBackend::cwd).
pub trait FsBackend {
    fn cwd(&self) -> &ArchivePath;
    fn cd<P: AsRef<str>>(&mut self, path: P) -> Result<()>;
    fn exists<P: AsRef<str>>(&self, path: P) -> bool;
    fn is_dir<P: AsRef<str>>(&self, path: P) -> Result<bool>;
    fn is_file<P: AsRef<str>>(&self, path: P) -> Result<bool>;
    fn ls<P: AsRef<str>>(&self, path: P) -> Result<DirectoryStream>;
    fn tree<P: AsRef<str>>(&self, path: P) -> Result<Vec<ArchivePath>>;
    fn mkdir<P: AsRef<str>>(&mut self, path: P) -> Result<()>;
    fn mkfile<P: AsRef<str>>(&mut self, file_path: P, content: Option<&[u8]>) -> Result<()>;
    fn read<P: AsRef<str>>(&self, path: P) -> Result<Vec<u8>>;
    fn open<P: AsRef<str>>(&self, path: P) -> Result<Box<dyn Read + Send>>;
    fn write<P: AsRef<str>>(&mut self, path: P, content: &[u8]) -> Result<()>;
    fn append<P: AsRef<str>>(&mut self, path: P, content: &[u8]) -> Result<()>;
    fn rm<P: AsRef<str>>(&mut self, path: P) -> Result<()>;
    fn mv<P: AsRef<str>, Q: AsRef<str>>(&mut self, from: P, to: Q) -> Result<()>;
    fn attributes<P: AsRef<str>>(&self, path: P) -> FileAttributes;
    fn cleanup(&mut self) -> bool;
}

pub(crate) mod utils {
    use crate::ArchivePath;
    use crate::path::SEPARATOR;

    /// Resolves `.` and `..` segments and collapses empty ones.
    /// `..` above the root stays at the root.
    pub fn normalize(path: &ArchivePath) -> ArchivePath {
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.as_str().split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        ArchivePath::new(segments.join("/"))
    }

}
