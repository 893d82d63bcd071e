mod filter;
mod handler;
mod map_archive;
mod node;

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use filter::Filter;
pub use handler::{ArchiveEvent, ArchiveEventHandler};
pub(crate) use handler::HandlerChain;
pub use map_archive::Archive;
pub use node::{Node, NodeType};

/// A reference-counted, lockable [`Archive`].
///
/// Used wherever one archive must be reachable from several owners: as the payload of a nested
/// archive asset, and as the backing store of [`ArchiveFs`](crate::ArchiveFs). Clones share the
/// same archive.
#[derive(Clone)]
pub struct SharedArchive(Arc<RwLock<Archive>>);

impl SharedArchive {
    pub fn new(archive: Archive) -> Self {
        Self(Arc::new(RwLock::new(archive)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Archive> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Archive> {
        self.0.write()
    }

    /// Whether both handles point at the same archive.
    pub fn ptr_eq(&self, other: &SharedArchive) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Archive> for SharedArchive {
    fn from(archive: Archive) -> Self {
        Self::new(archive)
    }
}

impl fmt::Debug for SharedArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(archive) => f
                .debug_struct("SharedArchive")
                .field("name", &archive.name())
                .field("id", &archive.id())
                .finish(),
            None => f.write_str("SharedArchive(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_archive() -> crate::Result<()> {
        let shared = SharedArchive::new(Archive::new("shared.jar"));
        let other = shared.clone();
        other.write().add(crate::Asset::text("x"), "/x")?;

        assert!(shared.ptr_eq(&other));
        assert!(shared.read().contains("/x"));
        assert!(!shared.ptr_eq(&SharedArchive::from(Archive::new("shared.jar"))));
        Ok(())
    }

    #[test]
    fn test_debug_while_locked() {
        let shared = SharedArchive::new(Archive::new("locked.jar"));
        let guard = shared.write();
        assert_eq!(format!("{shared:?}"), "SharedArchive(<locked>)");
        drop(guard);
        assert!(format!("{shared:?}").contains("locked.jar"));
    }
}
