use crate::ArchivePath;
use crate::asset::AssetRef;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeType {
    Asset,
    Directory,
}

/// An entry in an archive: a directory marker (no asset) or a leaf holding one asset.
///
/// Nodes carry no links to parents or children; children are derived from the owning
/// archive's path set (see [`Archive::children`](crate::Archive::children)).
#[derive(Debug, Clone)]
pub struct Node {
    path: ArchivePath,
    asset: Option<AssetRef>,
}

impl Node {
    pub fn directory(path: ArchivePath) -> Node {
        Node { path, asset: None }
    }

    pub fn leaf(path: ArchivePath, asset: AssetRef) -> Node {
        Node {
            path,
            asset: Some(asset),
        }
    }

    pub(crate) fn new(path: ArchivePath, asset: Option<AssetRef>) -> Node {
        Node { path, asset }
    }

    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    pub fn asset(&self) -> Option<&AssetRef> {
        self.asset.as_ref()
    }

    pub fn node_type(&self) -> NodeType {
        match self.asset {
            Some(_) => NodeType::Asset,
            None => NodeType::Directory,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.asset.is_some()
    }

    pub fn is_dir(&self) -> bool {
        self.asset.is_none()
    }

    pub(crate) fn with_path(self, path: ArchivePath) -> Node {
        Node {
            path,
            asset: self.asset,
        }
    }
}
