use std::path::{Path, PathBuf};

use crate::asset::Asset;
use crate::codec::{ArchiveFormat, ExportOptions};
use crate::core::Result;

/// Environment variable holding resource search roots, separated like `PATH`.
pub const RESOURCE_PATH_ENV: &str = "ARCHIVE_KIT_RESOURCE_PATH";

/// Per-archive settings.
///
/// * `default_format`: container format used when the archive is nested or re-read without an
///   explicit format, and the source of the generated name's extension.
/// * `export`: codec tuning applied whenever this archive is serialized.
/// * `resource_roots`: search path for [`resource`](ArchiveConfig::resource) assets.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveConfig {
    default_format: ArchiveFormat,
    export: ExportOptions,
    resource_roots: Vec<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            default_format: ArchiveFormat::Zip,
            export: ExportOptions::default(),
            resource_roots: Vec::new(),
        }
    }
}

impl ArchiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with resource roots taken from [`RESOURCE_PATH_ENV`].
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(value) = std::env::var_os(RESOURCE_PATH_ENV) {
            config.resource_roots = std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        config
    }

    pub fn default_format(&self) -> ArchiveFormat {
        self.default_format
    }

    pub fn set_default_format(&mut self, format: ArchiveFormat) {
        self.default_format = format;
    }

    pub fn export(&self) -> &ExportOptions {
        &self.export
    }

    pub fn set_export(&mut self, options: ExportOptions) {
        self.export = options;
    }

    pub fn resource_roots(&self) -> &[PathBuf] {
        &self.resource_roots
    }

    pub fn add_resource_root<P: AsRef<Path>>(&mut self, root: P) {
        self.resource_roots.push(root.as_ref().to_path_buf());
    }

    /// Resource asset resolved over this configuration's search roots.
    pub fn resource<S: Into<String>>(&self, name: S) -> Result<Asset> {
        Asset::resource(name, self.resource_roots.iter().cloned())
    }
}
