//! Interceptors run on every add.

use std::fmt;
use std::sync::Arc;

use crate::ArchivePath;
use crate::asset::AssetRef;

/// What a handler sees for one add: the target path and the current asset
/// (`None` when a directory is being added).
#[derive(Debug)]
pub struct ArchiveEvent {
    path: ArchivePath,
    asset: Option<AssetRef>,
}

impl ArchiveEvent {
    pub(crate) fn new(path: ArchivePath, asset: Option<AssetRef>) -> Self {
        Self { path, asset }
    }

    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    /// The asset as left by the previous handler, or the one passed to `add`.
    pub fn asset(&self) -> Option<&AssetRef> {
        self.asset.as_ref()
    }

    pub fn is_directory(&self) -> bool {
        self.asset.is_none()
    }

    /// Replaces the asset handed to the next handler and finally stored.
    /// Ignored for directory events.
    pub fn set_asset<A: Into<AssetRef>>(&mut self, asset: A) {
        if self.asset.is_some() {
            self.asset = Some(asset.into());
        }
    }

    pub(crate) fn into_asset(self) -> Option<AssetRef> {
        self.asset
    }
}

pub trait ArchiveEventHandler: Send + Sync {
    fn handle(&self, event: &mut ArchiveEvent);
}

impl<F> ArchiveEventHandler for F
where
    F: Fn(&mut ArchiveEvent) + Send + Sync,
{
    fn handle(&self, event: &mut ArchiveEvent) {
        self(event)
    }
}

/// Ordered list of handlers owned by one archive.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn ArchiveEventHandler>>,
}

impl HandlerChain {
    pub fn push(&mut self, handler: Arc<dyn ArchiveEventHandler>) {
        self.handlers.push(handler);
    }

    /// Folds the event through every handler, left to right.
    pub fn apply(&self, path: &ArchivePath, asset: Option<AssetRef>) -> Option<AssetRef> {
        if self.handlers.is_empty() {
            return asset;
        }
        let mut event = ArchiveEvent::new(path.clone(), asset);
        for handler in &self.handlers {
            handler.handle(&mut event);
        }
        event.into_asset()
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("len", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Asset;
    use parking_lot::Mutex;

    #[test]
    fn test_empty_chain_passes_through() {
        let chain = HandlerChain::default();
        let asset: AssetRef = Arc::new(Asset::text("a"));
        let out = chain.apply(&ArchivePath::new("/a"), Some(asset.clone())).unwrap();
        assert!(Arc::ptr_eq(&asset, &out));
    }

    #[test]
    fn test_output_feeds_next_handler() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let mut chain = HandlerChain::default();

        let log = seen.clone();
        chain.push(Arc::new(move |event: &mut ArchiveEvent| {
            log.lock().push(format!("first:{}", event.path()));
            event.set_asset(Asset::text("from first"));
        }));
        let log = seen.clone();
        chain.push(Arc::new(move |event: &mut ArchiveEvent| {
            let content = event.asset().unwrap().read_all().unwrap();
            log.lock().push(String::from_utf8(content).unwrap());
        }));

        let out = chain
            .apply(&ArchivePath::new("/x.txt"), Some(Arc::new(Asset::text("orig"))))
            .unwrap();
        assert_eq!(out.read_all().unwrap(), b"from first");
        assert_eq!(*seen.lock(), vec!["first:/x.txt", "from first"]);
    }

    #[test]
    fn test_directory_events_stay_directories() {
        let mut chain = HandlerChain::default();
        chain.push(Arc::new(|event: &mut ArchiveEvent| {
            assert!(event.is_directory());
            event.set_asset(Asset::text("ignored"));
        }));
        assert!(chain.apply(&ArchivePath::new("/dir"), None).is_none());
    }
}
