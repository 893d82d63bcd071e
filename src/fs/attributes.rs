use std::time::SystemTime;

use crate::archive::{Node, SharedArchive};
use crate::core::{ArchiveError, Result};
use crate::ArchivePath;

/// Basic attributes of one archive path, looked up on each call.
///
/// Archives keep no timestamps, so the time accessors always fail with
/// [`ArchiveError::Unsupported`].
#[derive(Debug, Clone)]
pub struct FileAttributes {
    archive: SharedArchive,
    path: ArchivePath,
}

impl FileAttributes {
    pub(crate) fn new(archive: SharedArchive, path: ArchivePath) -> Self {
        Self { archive, path }
    }

    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    fn node(&self) -> Option<Node> {
        self.archive.read().get(&self.path)
    }

    pub fn is_regular_file(&self) -> bool {
        self.node().is_some_and(|node| node.is_leaf())
    }

    pub fn is_directory(&self) -> bool {
        self.node().is_some_and(|node| node.is_dir())
    }

    pub fn is_symbolic_link(&self) -> bool {
        false
    }

    pub fn is_other(&self) -> bool {
        false
    }

    /// Content length in bytes; 0 for directories.
    pub fn size(&self) -> Result<u64> {
        let node = self
            .node()
            .ok_or_else(|| ArchiveError::NotFound(self.path.clone()))?;
        match node.asset() {
            Some(asset) => asset.size(),
            None => Ok(0),
        }
    }

    /// `<archive id><canonical path>`, stable for the life of the archive.
    pub fn file_key(&self) -> String {
        format!("{}{}", self.archive.read().id(), self.path.as_str())
    }

    pub fn creation_time(&self) -> Result<SystemTime> {
        Err(ArchiveError::Unsupported("creation time"))
    }

    pub fn last_modified_time(&self) -> Result<SystemTime> {
        Err(ArchiveError::Unsupported("last modified time"))
    }

    pub fn last_access_time(&self) -> Result<SystemTime> {
        Err(ArchiveError::Unsupported("last access time"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Archive, Asset};

    fn setup() -> Result<SharedArchive> {
        let mut archive = Archive::new("attributes.jar");
        archive
            .add(Asset::bytes(vec![7u8; 1024]), "/data.bin")?
            .add_as_directory("/dir")?;
        Ok(SharedArchive::new(archive))
    }

    #[test]
    fn test_file() -> Result<()> {
        let archive = setup()?;
        let attributes = FileAttributes::new(archive.clone(), ArchivePath::new("/data.bin"));

        assert!(attributes.is_regular_file());
        assert!(!attributes.is_directory());
        assert!(!attributes.is_symbolic_link());
        assert!(!attributes.is_other());
        assert_eq!(attributes.size()?, 1024);
        assert_eq!(
            attributes.file_key(),
            format!("{}/data.bin", archive.read().id())
        );
        Ok(())
    }

    #[test]
    fn test_directory_and_missing() -> Result<()> {
        let archive = setup()?;
        let dir = FileAttributes::new(archive.clone(), ArchivePath::new("/dir"));
        assert!(dir.is_directory());
        assert!(!dir.is_regular_file());
        assert_eq!(dir.size()?, 0);

        let missing = FileAttributes::new(archive, ArchivePath::new("/missing"));
        assert!(!missing.is_directory());
        assert!(!missing.is_regular_file());
        assert!(matches!(missing.size(), Err(ArchiveError::NotFound(_))));
        Ok(())
    }

    #[test]
    fn test_times_unsupported() -> Result<()> {
        let attributes = FileAttributes::new(setup()?, ArchivePath::new("/data.bin"));
        assert!(matches!(attributes.creation_time(), Err(ArchiveError::Unsupported(_))));
        assert!(matches!(attributes.last_modified_time(), Err(ArchiveError::Unsupported(_))));
        assert!(matches!(attributes.last_access_time(), Err(ArchiveError::Unsupported(_))));
        Ok(())
    }

    #[test]
    fn test_lookup_is_lazy() -> Result<()> {
        let archive = setup()?;
        let attributes = FileAttributes::new(archive.clone(), ArchivePath::new("/late.txt"));
        assert!(!attributes.is_regular_file());

        archive.write().add(Asset::text("late"), "/late.txt")?;
        assert!(attributes.is_regular_file());
        assert_eq!(attributes.size()?, 4);
        Ok(())
    }
}
