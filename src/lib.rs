//! Virtual hierarchical archives for Rust.
//! Build an archive in memory, merge, filter and nest it, then serialize it to zip or tar
//! (and read it back) without ever touching a staging directory.
//!
//! ### Overview
//!
//! `archive-kit` keeps an archive as an insertion-ordered map from [`ArchivePath`] to [`Node`].
//! A node is either a directory or a leaf holding one [`Asset`], a description of where the
//! bytes come from (memory, file, classpath-like resource, URL, another archive, ...).
//!
//! **Key ideas**:
//! - **Order**: enumeration and export follow add order, so generated archives are reproducible.
//! - **Structure**: content can never be placed inside content; illegal operations fail without
//!   changing the archive.
//! - **Sharing**: assets are reference counted; merges and shallow copies never duplicate bytes.
//! - **Nesting**: an archive can be added to another one and stays live; paths resolve through it.
//! - **Familiar access**: [`ArchiveFs`] exposes an archive through the unix-like [`FsBackend`] API.
//!
//! ```
//! use std::io::Cursor;
//! use archive_kit::{Archive, ArchiveFormat, Asset};
//!
//! let mut archive = Archive::new("app.jar");
//! archive.add(Asset::text("Main-Class: App\n"), "/META-INF/MANIFEST.MF").unwrap();
//!
//! let bytes = archive.export_to_vec(ArchiveFormat::Zip).unwrap();
//! let copy = Archive::import("copy.jar", ArchiveFormat::Zip, Cursor::new(bytes)).unwrap();
//! assert!(copy.contains("/META-INF/MANIFEST.MF"));
//! ```

mod archive;
mod asset;
mod codec;
mod config;
mod core;
mod fs;
mod path;

pub use archive::{
    Archive, ArchiveEvent, ArchiveEventHandler, Filter, Node, NodeType, SharedArchive,
};
pub use asset::{ArchiveAsset, Asset, AssetRef, AssetSource, ResourceAsset};
pub use codec::{ArchiveFormat, ExportOptions, ZipCompression};
pub use config::{ArchiveConfig, RESOURCE_PATH_ENV};
pub use crate::core::{ArchiveError, BoxError, CodecOp, FsBackend, Result};
pub use fs::{ArchiveFs, DirectoryStream, FileAttributes};
pub use path::{ArchivePath, SEPARATOR};
