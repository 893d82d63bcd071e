//! Binary container formats. Export and import both follow the archive's insertion order.

mod tar_codec;
mod zip_codec;

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::Archive;
use crate::core::{ArchiveError, CodecOp, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Extension appended to generated archive names.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::Tar => ".tar",
            ArchiveFormat::TarGz => ".tar.gz",
        }
    }

    /// Guesses the format from a file name
    /// (`.zip`, `.jar`, `.war`, `.ear`, `.tar`, `.tar.gz`, `.tgz`).
    pub fn from_name(name: &str) -> Option<ArchiveFormat> {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".tar") {
            Some(ArchiveFormat::Tar)
        } else if [".zip", ".jar", ".war", ".ear"]
            .iter()
            .any(|ext| name.ends_with(ext))
        {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension()[1..])
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ZipCompression {
    Stored,
    #[default]
    Deflated,
}

/// Codec tuning applied on export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    zip_compression: ZipCompression,
    gzip_level: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            zip_compression: ZipCompression::Deflated,
            gzip_level: 6,
        }
    }
}

impl ExportOptions {
    pub fn zip_compression(&self) -> ZipCompression {
        self.zip_compression
    }

    pub fn set_zip_compression(&mut self, compression: ZipCompression) {
        self.zip_compression = compression;
    }

    pub fn gzip_level(&self) -> u32 {
        self.gzip_level
    }

    /// Sets the gzip level used for [`ArchiveFormat::TarGz`]; clamped to `0..=9`.
    pub fn set_gzip_level(&mut self, level: u32) {
        self.gzip_level = level.min(9);
    }
}

impl Archive {
    /// Serializes the archive in `format` into memory.
    ///
    /// # Behavior
    /// - One entry per node, root excluded, in insertion order.
    /// - Directories become empty entries named with a trailing `/`.
    /// - Nested archives are written as a single opaque entry holding their own serialization.
    ///
    /// # Errors
    /// * [`ArchiveError::Codec`] naming the entry whose content could not be read or written.
    pub fn export_to_vec(&self, format: ArchiveFormat) -> Result<Vec<u8>> {
        let options = self.config().export();
        let content = match format {
            ArchiveFormat::Zip => zip_codec::export(self, options)?,
            ArchiveFormat::Tar => tar_codec::export(self, format, Vec::new())?,
            ArchiveFormat::TarGz => {
                let encoder = GzEncoder::new(Vec::new(), Compression::new(options.gzip_level()));
                tar_codec::export(self, format, encoder)?
                    .finish()
                    .map_err(|e| ArchiveError::codec(CodecOp::Export, format, "<gzip trailer>", e))?
            }
        };

        tracing::info!(
            archive = %self.name(),
            %format,
            entries = self.len(),
            bytes = content.len(),
            "archive exported"
        );
        Ok(content)
    }

    /// Serializes the archive in `format` into `writer`.
    pub fn export<W: Write>(&self, format: ArchiveFormat, mut writer: W) -> Result<()> {
        let content = self.export_to_vec(format)?;
        writer
            .write_all(&content)
            .and_then(|_| writer.flush())
            .map_err(|e| ArchiveError::codec(CodecOp::Export, format, "<output>", e))
    }

    /// Writes the archive to a host file.
    ///
    /// # Errors
    /// * [`ArchiveError::InvalidArgument`] if `path` exists and `overwrite` is false.
    pub fn export_to_file<P: AsRef<Path>>(
        &self,
        path: P,
        format: ArchiveFormat,
        overwrite: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(ArchiveError::InvalidArgument(format!(
                "file {} already exists and overwrite is not allowed",
                path.display()
            )));
        }
        let content = self.export_to_vec(format)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Builds a new archive named `name` from a container stream.
    ///
    /// Entries are added in stream order. Any failure aborts the import; no partially
    /// built archive is returned.
    pub fn import<S: Into<String>, R: Read>(
        name: S,
        format: ArchiveFormat,
        reader: R,
    ) -> Result<Archive> {
        let mut archive = Archive::with_format(name, format);
        match format {
            ArchiveFormat::Zip => zip_codec::import(&mut archive, reader)?,
            ArchiveFormat::Tar => tar_codec::import(&mut archive, format, reader)?,
            ArchiveFormat::TarGz => {
                tar_codec::import(&mut archive, format, GzDecoder::new(reader))?
            }
        }

        tracing::info!(
            archive = %archive.name(),
            %format,
            entries = archive.len(),
            "archive imported"
        );
        Ok(archive)
    }

    /// Imports a container stream into this archive. The entries are merged all at once, so a
    /// failed import leaves this archive untouched.
    pub fn import_into<R: Read>(
        &mut self,
        reader: R,
        format: ArchiveFormat,
    ) -> Result<&mut Self> {
        let imported = Archive::import(self.name().to_string(), format, reader)?;
        self.merge(&imported)
    }

    /// Imports a host file; the archive is named after the file.
    pub fn import_from_file<P: AsRef<Path>>(path: P, format: ArchiveFormat) -> Result<Archive> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path)?;
        Archive::import(name, format, file)
    }
}
