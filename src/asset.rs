//! Content sources stored at leaf nodes.
//!
//! An [`Asset`] produces a fresh byte stream on every [`open_stream`](Asset::open_stream) call.
//! Streams are single-use: callers needing the content twice must buffer it.
//! Assets are stored behind [`AssetRef`] (`Arc<Asset>`), so shallow copies and merges share
//! the same instance rather than duplicating content.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::{Buf, Bytes};
use url::Url;

use crate::archive::SharedArchive;
use crate::codec::ArchiveFormat;
use crate::core::{ArchiveError, Result};

/// Shared handle to an asset. Cloning aliases, never copies content.
pub type AssetRef = Arc<Asset>;

/// User-supplied content source.
///
/// Any `Fn() -> anyhow::Result<Box<dyn Read + Send>>` closure is a source.
pub trait AssetSource: Send + Sync {
    fn open_stream(&self) -> anyhow::Result<Box<dyn Read + Send>>;
}

impl<F> AssetSource for F
where
    F: Fn() -> anyhow::Result<Box<dyn Read + Send>> + Send + Sync,
{
    fn open_stream(&self) -> anyhow::Result<Box<dyn Read + Send>> {
        self()
    }
}

impl fmt::Debug for dyn AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AssetSource")
    }
}

/// Named lookup over an ordered list of search roots; the first root holding `name` wins.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAsset {
    name: String,
    roots: Vec<PathBuf>,
}

impl ResourceAsset {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Locates the resource on the search path.
    pub fn locate(&self) -> Option<PathBuf> {
        let name = self.name.trim_start_matches('/');
        self.roots
            .iter()
            .map(|root| root.join(name))
            .find(|candidate| candidate.is_file())
    }
}

/// An archive embedded as a single asset.
///
/// The child stays live: mutations made through the [`SharedArchive`] after it was added are
/// visible both through path resolution in the parent and in the bytes produced on export.
#[derive(Debug, Clone)]
pub struct ArchiveAsset {
    archive: SharedArchive,
    format: ArchiveFormat,
}

impl ArchiveAsset {
    pub fn new(archive: SharedArchive, format: ArchiveFormat) -> Self {
        Self { archive, format }
    }

    pub fn archive(&self) -> &SharedArchive {
        &self.archive
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }
}

#[derive(Debug)]
pub enum Asset {
    Empty,
    Bytes(Bytes),
    Text(String),
    Resource(ResourceAsset),
    File(PathBuf),
    Url(Url),
    /// One fully qualified provider name per line, each terminated by `\n`.
    ServiceProvider(Vec<String>),
    /// Carries a logical name used in place of a path basename at placement time.
    Named {
        name: String,
        asset: AssetRef,
    },
    Archive(ArchiveAsset),
    Source(Arc<dyn AssetSource>),
}

impl Asset {
    pub fn empty() -> Self {
        Asset::Empty
    }

    pub fn bytes<B: Into<Bytes>>(content: B) -> Self {
        Asset::Bytes(content.into())
    }

    pub fn text<S: Into<String>>(content: S) -> Self {
        Asset::Text(content.into())
    }

    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Asset::File(path.as_ref().to_path_buf())
    }

    /// Creates a resource asset looked up over `roots` when opened.
    pub fn resource<S, I, P>(name: S, roots: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let name = name.into();
        if name.trim_start_matches('/').is_empty() {
            return Err(ArchiveError::InvalidArgument(
                "resource name must be specified".into(),
            ));
        }
        Ok(Asset::Resource(ResourceAsset {
            name,
            roots: roots.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn url<S: AsRef<str>>(url: S) -> Result<Self> {
        let url = Url::parse(url.as_ref())
            .map_err(|e| ArchiveError::InvalidArgument(format!("invalid url: {e}")))?;
        Ok(Asset::Url(url))
    }

    pub fn service_provider<I, S>(providers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let providers: Vec<String> = providers.into_iter().map(Into::into).collect();
        if providers.is_empty() {
            return Err(ArchiveError::InvalidArgument(
                "at least one provider must be specified".into(),
            ));
        }
        if providers.iter().any(|p| p.trim().is_empty()) {
            return Err(ArchiveError::InvalidArgument(
                "provider names must not be blank".into(),
            ));
        }
        Ok(Asset::ServiceProvider(providers))
    }

    pub fn named<S: Into<String>, A: Into<AssetRef>>(name: S, asset: A) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ArchiveError::InvalidArgument("name must be specified".into()));
        }
        Ok(Asset::Named {
            name,
            asset: asset.into(),
        })
    }

    pub fn archive(archive: SharedArchive, format: ArchiveFormat) -> Self {
        Asset::Archive(ArchiveAsset::new(archive, format))
    }

    pub fn source<S: AssetSource + 'static>(source: S) -> Self {
        Asset::Source(Arc::new(source))
    }

    /// Logical name of a [`Asset::Named`] asset.
    pub fn name(&self) -> Option<&str> {
        match self {
            Asset::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_archive(&self) -> Option<&ArchiveAsset> {
        match self {
            Asset::Archive(nested) => Some(nested),
            _ => None,
        }
    }

    /// Opens a new stream over the content. File and network variants block.
    pub fn open_stream(&self) -> Result<Box<dyn Read + Send>> {
        match self {
            Asset::Empty => Ok(Box::new(io::empty())),
            Asset::Bytes(bytes) => Ok(Box::new(bytes.clone().reader())),
            Asset::Text(text) => Ok(Box::new(Cursor::new(text.clone().into_bytes()))),
            Asset::Resource(resource) => {
                let found = resource
                    .locate()
                    .ok_or_else(|| ArchiveError::ResourceNotFound(resource.name.clone()))?;
                Ok(Box::new(File::open(found)?))
            }
            Asset::File(path) => Ok(Box::new(File::open(path)?)),
            Asset::Url(url) => {
                let mut response = ureq::get(url.as_str()).call().map_err(|e| ArchiveError::Fetch {
                    url: url.to_string(),
                    source: Box::new(e),
                })?;
                let content = response
                    .body_mut()
                    .read_to_vec()
                    .map_err(|e| ArchiveError::Fetch {
                        url: url.to_string(),
                        source: Box::new(e),
                    })?;
                Ok(Box::new(Cursor::new(content)))
            }
            Asset::ServiceProvider(providers) => {
                let mut listing = String::new();
                for provider in providers {
                    listing.push_str(provider);
                    listing.push('\n');
                }
                Ok(Box::new(Cursor::new(listing.into_bytes())))
            }
            Asset::Named { asset, .. } => asset.open_stream(),
            Asset::Archive(nested) => {
                let content = nested.archive.read().export_to_vec(nested.format)?;
                Ok(Box::new(Cursor::new(content)))
            }
            Asset::Source(source) => Ok(source.open_stream()?),
        }
    }

    /// Reads the whole content into memory.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.open_stream()?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Byte length of the content. Streams the content without keeping it.
    pub fn size(&self) -> Result<u64> {
        match self {
            Asset::Empty => Ok(0),
            Asset::Bytes(bytes) => Ok(bytes.len() as u64),
            Asset::Text(text) => Ok(text.len() as u64),
            Asset::File(path) => Ok(std::fs::metadata(path)?.len()),
            _ => Ok(io::copy(&mut self.open_stream()?, &mut io::sink())?),
        }
    }
}
