//! This module provides the in-memory archive: an insertion-ordered map from canonical paths
//! to nodes.

use std::sync::Arc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::archive::{ArchiveEventHandler, Filter, HandlerChain, Node, SharedArchive};
use crate::asset::{ArchiveAsset, Asset, AssetRef};
use crate::codec::ArchiveFormat;
use crate::config::ArchiveConfig;
use crate::core::{ArchiveError, Result};
use crate::ArchivePath;

type Entries = IndexMap<ArchivePath, Node>;

/// A virtual archive that stores directory and asset nodes in memory.
///
/// ### Internal state
///
/// * `id`: identity distinct even between two archives with the same name and content.
/// * `name`: logical name; used as the entry name when the archive is nested in another one.
/// * `config`: default container format, export tuning and resource search path.
/// * `entries`: the core storage map.
///   - Key: canonical [`ArchivePath`] (absolute, no trailing separator).
///   - Value: [`Node`], a directory marker or a leaf holding one asset.
///   - Uses `IndexMap`, so enumeration and export follow add order, not lexical order.
/// * `handlers`: interceptors run on every add (see [`add_handler`](Archive::add_handler)).
///
/// ### Invariants
///
/// 1. **Root existence**: `/` is always present and is a directory. It is never enumerated.
/// 2. **Parent consistency**: for any entry `/a/b/c` there is a directory entry `/a/b`.
/// 3. **No content inside content**: no entry has a leaf as an ancestor.
/// 4. **Uniqueness**: one node per canonical path; re-adding a leaf replaces its asset in place.
///
/// Failed operations leave the archive unchanged.
///
/// ### Thread Safety
///
/// Mutation requires `&mut self`. To share an archive (nesting, filesystem view) wrap it in a
/// [`SharedArchive`].
///
/// ### Example
///
/// ```
/// use archive_kit::{Archive, Asset};
///
/// let mut archive = Archive::new("app.jar");
/// archive
///     .add(Asset::text("Hello"), "/docs/note.txt").unwrap()
///     .add_as_directory("/empty").unwrap();
///
/// assert!(archive.contains("/docs"));
/// assert!(archive.get("/docs/note.txt").unwrap().is_leaf());
/// ```
#[derive(Debug)]
pub struct Archive {
    id: Uuid,
    name: String,
    config: Arc<ArchiveConfig>,
    entries: Entries,
    handlers: HandlerChain,
}

impl Archive {
    /// Creates an empty archive with the default configuration (zip format).
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_config(name, ArchiveConfig::default())
    }

    pub fn with_format<S: Into<String>>(name: S, format: ArchiveFormat) -> Self {
        let mut config = ArchiveConfig::default();
        config.set_default_format(format);
        Self::with_config(name, config)
    }

    pub fn with_config<S: Into<String>>(name: S, config: ArchiveConfig) -> Self {
        Self::fresh(name.into(), Arc::new(config))
    }

    /// Creates an archive named `<uuid><extension>` for the given format.
    pub fn unnamed(format: ArchiveFormat) -> Self {
        Self::with_format(format!("{}{}", Uuid::new_v4(), format.extension()), format)
    }

    fn fresh(name: String, config: Arc<ArchiveConfig>) -> Self {
        let mut entries = Entries::new();
        entries.insert(ArchivePath::root(), Node::directory(ArchivePath::root()));
        Self {
            id: Uuid::new_v4(),
            name,
            config,
            entries,
            handlers: HandlerChain::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn default_format(&self) -> ArchiveFormat {
        self.config.default_format()
    }

    /// Number of entries, root excluded.
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a handler to the chain run on every add.
    pub fn add_handler<H: ArchiveEventHandler + 'static>(&mut self, handler: H) -> &mut Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn add_handlers<I>(&mut self, handlers: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn ArchiveEventHandler>>,
    {
        for handler in handlers {
            self.handlers.push(handler);
        }
        self
    }

    /// Stores `asset` at `path`.
    ///
    /// # Behavior
    /// - Missing ancestor directories are created.
    /// - The asset runs through the handler chain; the chain's output is what gets stored.
    /// - An occupied leaf path is overwritten in place (its enumeration position is kept).
    ///
    /// # Errors
    /// * [`ArchiveError::IllegalPath`] if:
    ///   - an ancestor of `path` is a leaf (content cannot be placed inside content);
    ///   - `path` is a directory that still has descendants;
    ///   - `path` is the root.
    ///
    /// # Example
    /// ```
    /// use archive_kit::{Archive, Asset};
    ///
    /// let mut archive = Archive::new("test.jar");
    /// archive.add(Asset::text("x"), "/test.properties").unwrap();
    ///
    /// let nested = archive.add(Asset::text("y"), "/test.properties/somewhere");
    /// assert!(nested.is_err());
    /// ```
    pub fn add<A, P>(&mut self, asset: A, path: P) -> Result<&mut Self>
    where
        A: Into<AssetRef>,
        P: Into<ArchivePath>,
    {
        let path = canonical(path.into());
        let asset = asset.into();
        validate_leaf(&self.entries, &path)?;

        let stored = self
            .handlers
            .apply(&path, Some(asset.clone()))
            .unwrap_or(asset);
        place_leaf(&mut self.entries, path.clone(), stored)?;

        tracing::debug!(archive = %self.name, path = %path, "asset added");
        Ok(self)
    }

    /// Stores `asset` at `base/name`.
    pub fn add_at<A, P>(&mut self, asset: A, base: P, name: &str) -> Result<&mut Self>
    where
        A: Into<AssetRef>,
        P: Into<ArchivePath>,
    {
        if name.is_empty() {
            return Err(ArchiveError::InvalidArgument("name must be specified".into()));
        }
        let path = base.into().join(name);
        self.add(asset, path)
    }

    /// Stores a [`Asset::Named`] asset at `base/<its name>`.
    pub fn add_named<A, P>(&mut self, base: P, asset: A) -> Result<&mut Self>
    where
        A: Into<AssetRef>,
        P: Into<ArchivePath>,
    {
        let asset = asset.into();
        let name = asset
            .name()
            .ok_or_else(|| ArchiveError::InvalidArgument("asset carries no name".into()))?
            .to_string();
        let path = base.into().join(name.as_str());
        self.add(asset, path)
    }

    /// Nests `child` at `base/<child name>`; reading that entry's bytes exports the child
    /// with `format`. The child is shared, so later changes to it stay visible.
    pub fn add_archive<P>(
        &mut self,
        child: &SharedArchive,
        base: P,
        format: ArchiveFormat,
    ) -> Result<&mut Self>
    where
        P: Into<ArchivePath>,
    {
        let name = child.read().name().to_string();
        if name.is_empty() {
            return Err(ArchiveError::InvalidArgument(
                "nested archive must have a name".into(),
            ));
        }
        let path = base.into().join(name.as_str());
        self.add(Asset::archive(child.clone(), format), path)
    }

    /// Creates an empty directory (and its missing parents).
    ///
    /// Adding an already existing directory is a no-op; the handler chain still runs.
    pub fn add_as_directory<P: Into<ArchivePath>>(&mut self, path: P) -> Result<&mut Self> {
        let path = canonical(path.into());
        validate_dir(&self.entries, &path)?;
        self.handlers.apply(&path, None);
        place_dir(&mut self.entries, path.clone())?;

        tracing::debug!(archive = %self.name, path = %path, "directory added");
        Ok(self)
    }

    /// Creates several directories; none is created if any of them is illegal.
    pub fn add_as_directories<I, P>(&mut self, paths: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<ArchivePath>,
    {
        let paths: Vec<ArchivePath> = paths.into_iter().map(|p| canonical(p.into())).collect();
        for path in &paths {
            validate_dir(&self.entries, path)?;
        }
        for path in paths {
            self.add_as_directory(path)?;
        }
        Ok(self)
    }

    /// Returns the node at `path`, descending into nested archives when `path` reaches past
    /// a nested archive entry. The returned node carries the path as seen from this archive.
    pub fn get<P: Into<ArchivePath>>(&self, path: P) -> Option<Node> {
        let path = canonical(path.into());
        if let Some(node) = self.entries.get(&path) {
            return Some(node.clone());
        }
        let (_, nested, remainder) = self.nested_boundary(&path)?;
        let node = nested.archive().read().get(remainder)?;
        Some(node.with_path(path))
    }

    pub fn contains<P: Into<ArchivePath>>(&self, path: P) -> bool {
        let path = canonical(path.into());
        self.entries.contains_key(&path) || self.get(path).is_some()
    }

    /// Removes `path` and its whole subtree.
    ///
    /// # Returns
    /// * `Some(node)` - the removed node (its descendants are gone too).
    /// * `None` - nothing existed at `path`.
    ///
    /// Deleting `/` empties the archive; the root itself is kept.
    pub fn delete<P: Into<ArchivePath>>(&mut self, path: P) -> Option<Node> {
        let path = canonical(path.into());
        let Some(removed) = self.entries.get(&path).cloned() else {
            let (_, nested, remainder) = self.nested_boundary(&path)?;
            return nested
                .archive()
                .write()
                .delete(remainder)
                .map(|node| node.with_path(path));
        };

        let before = self.entries.len();
        self.entries
            .retain(|p, _| p.is_root() || !p.starts_with(&path));

        tracing::debug!(
            archive = %self.name,
            path = %path,
            removed = before - self.entries.len(),
            "entries deleted"
        );
        Some(removed)
    }

    /// Relocates the subtree rooted at `source` to `target`, keeping every descendant's
    /// path relative to the moved root.
    ///
    /// # Errors
    /// * [`ArchiveError::IllegalPath`] if:
    ///   - `source` does not exist or is the root;
    ///   - `target` lies inside `source`;
    ///   - the relocated entries would violate the tree invariants at `target`.
    pub fn mv<P, Q>(&mut self, source: P, target: Q) -> Result<()>
    where
        P: Into<ArchivePath>,
        Q: Into<ArchivePath>,
    {
        let source = canonical(source.into());
        let target = canonical(target.into());
        if !self.entries.contains_key(&source) {
            return Err(ArchiveError::illegal(&source, "source does not exist"));
        }
        if source.is_root() {
            return Err(ArchiveError::illegal(&source, "the root cannot be moved"));
        }
        if source == target {
            return Ok(());
        }
        if target.starts_with(&source) {
            return Err(ArchiveError::illegal(
                &target,
                format!("destination is inside source {source}"),
            ));
        }

        let moved: Vec<(ArchivePath, Option<AssetRef>)> = self
            .entries
            .iter()
            .filter_map(|(path, node)| {
                path.strip_prefix(&source)
                    .map(|rest| (canonical(target.join(&rest)), node.asset().cloned()))
            })
            .collect();

        let mut staged = self.entries.clone();
        staged.retain(|p, _| p.is_root() || !p.starts_with(&source));
        for (path, asset) in moved {
            match asset {
                Some(asset) => place_leaf(&mut staged, path, asset)?,
                None => place_dir(&mut staged, path)?,
            }
        }
        self.entries = staged;

        tracing::debug!(archive = %self.name, from = %source, to = %target, "subtree moved");
        Ok(())
    }

    /// Copies every entry of `source` into this archive at the same paths.
    pub fn merge(&mut self, source: &Archive) -> Result<&mut Self> {
        self.merge_filtered(source, ArchivePath::root(), &Filter::IncludeAll)
    }

    /// Copies every entry of `source` below `base`.
    pub fn merge_at<P: Into<ArchivePath>>(
        &mut self,
        source: &Archive,
        base: P,
    ) -> Result<&mut Self> {
        self.merge_filtered(source, base, &Filter::IncludeAll)
    }

    /// Copies the entries of `source` accepted by `filter` below `base`.
    ///
    /// # Behavior
    /// - Target path of each entry is `base` joined with its path in `source`.
    /// - Directories present in both trees are united without error.
    /// - Assets are shared with `source`, not copied, and run through this archive's handlers.
    /// - All or nothing: if any entry is illegal here, this archive is left unchanged.
    pub fn merge_filtered<P: Into<ArchivePath>>(
        &mut self,
        source: &Archive,
        base: P,
        filter: &Filter,
    ) -> Result<&mut Self> {
        let base = canonical(base.into());
        let mut staged = self.entries.clone();
        let mut merged = 0usize;

        for (path, node) in source.content() {
            if !filter.includes(path) {
                continue;
            }
            let target = canonical(base.join(path));
            match node.asset() {
                Some(asset) => {
                    validate_leaf(&staged, &target)?;
                    let stored = self
                        .handlers
                        .apply(&target, Some(asset.clone()))
                        .unwrap_or_else(|| asset.clone());
                    place_leaf(&mut staged, target, stored)?;
                }
                None => {
                    validate_dir(&staged, &target)?;
                    self.handlers.apply(&target, None);
                    place_dir(&mut staged, target)?;
                }
            }
            merged += 1;
        }
        self.entries = staged;

        tracing::debug!(
            archive = %self.name,
            source = %source.name,
            base = %base,
            merged,
            "archive merged"
        );
        Ok(self)
    }

    /// Returns a new archive holding only the entries accepted by `filter`, plus the
    /// ancestor directories they need. Assets are shared; handlers are not carried over.
    pub fn filter(&self, filter: &Filter) -> Archive {
        let mut filtered = Archive::fresh(self.name.clone(), self.config.clone());
        for (path, node) in self.content() {
            if filter.includes(path) {
                graft(&mut filtered.entries, path.clone(), node.asset().cloned());
            }
        }
        filtered
    }

    /// Returns a new archive with its own path map whose assets are the very same instances
    /// as in `self`. Structural changes to either archive do not affect the other; changes to
    /// a shared asset's backing resource are seen by both. Handlers are not copied.
    pub fn shallow_copy(&self) -> Archive {
        Archive {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            config: self.config.clone(),
            entries: self.entries.clone(),
            handlers: HandlerChain::default(),
        }
    }

    /// Iterates over all entries except the root, in insertion order.
    pub fn content(&self) -> impl Iterator<Item = (&ArchivePath, &Node)> {
        self.entries.iter().filter(|(path, _)| !path.is_root())
    }

    /// Snapshot of all entries except the root, in insertion order.
    pub fn get_content(&self) -> IndexMap<ArchivePath, Node> {
        self.content()
            .map(|(path, node)| (path.clone(), node.clone()))
            .collect()
    }

    pub fn content_filtered(&self, filter: &Filter) -> IndexMap<ArchivePath, Node> {
        self.content()
            .filter(|(path, _)| filter.includes(path))
            .map(|(path, node)| (path.clone(), node.clone()))
            .collect()
    }

    /// Immediate children of `path`, in insertion order; derived from the path set.
    /// A nested archive entry lists the root of that archive.
    pub fn children<P: Into<ArchivePath>>(&self, path: P) -> Vec<Node> {
        let path = canonical(path.into());
        if let Some(node) = self.entries.get(&path) {
            if let Some(nested) = node.asset().and_then(|asset| asset.as_archive()) {
                let children = nested.archive().read().children(ArchivePath::root());
                return children
                    .into_iter()
                    .map(|child| {
                        let full = canonical(path.join(child.path()));
                        child.with_path(full)
                    })
                    .collect();
            }
            let depth = path.depth() + 1;
            return self
                .entries
                .iter()
                .filter(|(p, _)| p.depth() == depth && p.starts_with(&path))
                .map(|(_, node)| node.clone())
                .collect();
        }
        let Some((prefix, nested, remainder)) = self.nested_boundary(&path) else {
            return Vec::new();
        };
        let children = nested.archive().read().children(remainder);
        children
            .into_iter()
            .map(|node| {
                let full = canonical(prefix.join(node.path()));
                node.with_path(full)
            })
            .collect()
    }

    /// Reads the leaf at `path` as an archive in `format` and stores it back as a nested
    /// archive entry, so changes made through the returned handle are part of this archive.
    ///
    /// # Returns
    /// * `Ok(Some(archive))` - the nested archive (an existing one is returned as is).
    /// * `Ok(None)` - nothing exists at `path`.
    /// * `Err(_)` - `path` is a directory, or its content could not be read in `format`.
    pub fn get_as_archive<P: Into<ArchivePath>>(
        &mut self,
        path: P,
        format: ArchiveFormat,
    ) -> Result<Option<SharedArchive>> {
        let path = canonical(path.into());
        let Some(node) = self.entries.get(&path) else {
            return Ok(None);
        };
        let Some(asset) = node.asset() else {
            return Err(ArchiveError::InvalidArgument(format!(
                "{path} is a directory, not an archive"
            )));
        };
        if let Some(nested) = asset.as_archive() {
            return Ok(Some(nested.archive().clone()));
        }

        let mut config = (*self.config).clone();
        config.set_default_format(format);
        let mut child = Archive::with_config(path.as_str(), config);
        child.import_into(asset.open_stream()?, format)?;

        let shared = SharedArchive::new(child);
        let replacement = Asset::Archive(ArchiveAsset::new(shared.clone(), format));
        self.entries
            .insert(path.clone(), Node::leaf(path, Arc::new(replacement)));
        Ok(Some(shared))
    }

    /// Like [`get_as_archive`](Archive::get_as_archive), with the format guessed from the
    /// entry's extension and falling back to this archive's default format.
    pub fn get_as_archive_default<P: Into<ArchivePath>>(
        &mut self,
        path: P,
    ) -> Result<Option<SharedArchive>> {
        let path = canonical(path.into());
        let format = ArchiveFormat::from_name(path.name()).unwrap_or(self.default_format());
        self.get_as_archive(path, format)
    }

    /// Reads every leaf accepted by `filter` as an archive in `format`.
    pub fn get_as_archives(
        &mut self,
        filter: &Filter,
        format: ArchiveFormat,
    ) -> Result<Vec<SharedArchive>> {
        let paths: Vec<ArchivePath> = self
            .content()
            .filter(|(path, node)| node.is_leaf() && filter.includes(path))
            .map(|(path, _)| path.clone())
            .collect();

        let mut archives = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(archive) = self.get_as_archive(path, format)? {
                archives.push(archive);
            }
        }
        Ok(archives)
    }

    /// Finds the nested archive entry that `path` reaches past, if any.
    /// Returns the entry's path, the nested asset, and `path` relative to the nested archive.
    fn nested_boundary(
        &self,
        path: &ArchivePath,
    ) -> Option<(ArchivePath, ArchiveAsset, ArchivePath)> {
        // the nearest existing ancestor decides: a directory means `path` is simply absent
        let ancestor = path.ancestors().find(|a| self.entries.contains_key(a))?;
        let nested = self.entries.get(&ancestor)?.asset()?.as_archive()?.clone();
        let remainder = path.strip_prefix(&ancestor)?;
        Some((ancestor, nested, remainder))
    }
}

fn canonical(path: ArchivePath) -> ArchivePath {
    if path.is_directory_form() {
        ArchivePath::new(path.as_str())
    } else {
        path
    }
}

fn leaf_ancestor(entries: &Entries, path: &ArchivePath) -> Option<ArchivePath> {
    path.ancestors()
        .find(|a| entries.get(a).is_some_and(Node::is_leaf))
}

fn has_descendants(entries: &Entries, path: &ArchivePath) -> bool {
    entries
        .keys()
        .any(|p| p != path && !p.is_root() && p.starts_with(path))
}

fn validate_leaf(entries: &Entries, path: &ArchivePath) -> Result<()> {
    if path.is_root() {
        return Err(ArchiveError::illegal(path, "an asset cannot be stored at the root"));
    }
    if let Some(leaf) = leaf_ancestor(entries, path) {
        return Err(ArchiveError::illegal(
            path,
            format!("parent {leaf} is an asset, not a directory"),
        ));
    }
    if entries.get(path).is_some_and(Node::is_dir) && has_descendants(entries, path) {
        return Err(ArchiveError::illegal(path, "directory is not empty"));
    }
    Ok(())
}

fn validate_dir(entries: &Entries, path: &ArchivePath) -> Result<()> {
    if let Some(leaf) = leaf_ancestor(entries, path) {
        return Err(ArchiveError::illegal(
            path,
            format!("parent {leaf} is an asset, not a directory"),
        ));
    }
    if entries.get(path).is_some_and(Node::is_leaf) {
        return Err(ArchiveError::illegal(path, "an asset already exists here"));
    }
    Ok(())
}

fn ensure_parents(entries: &mut Entries, path: &ArchivePath) {
    let mut missing: Vec<ArchivePath> = path
        .ancestors()
        .take_while(|a| !entries.contains_key(a))
        .collect();
    missing.reverse();
    for dir in missing {
        entries.insert(dir.clone(), Node::directory(dir));
    }
}

fn place_leaf(entries: &mut Entries, path: ArchivePath, asset: AssetRef) -> Result<()> {
    validate_leaf(entries, &path)?;
    ensure_parents(entries, &path);
    entries.insert(path.clone(), Node::leaf(path, asset));
    Ok(())
}

fn place_dir(entries: &mut Entries, path: ArchivePath) -> Result<()> {
    validate_dir(entries, &path)?;
    if entries.contains_key(&path) {
        return Ok(());
    }
    ensure_parents(entries, &path);
    entries.insert(path.clone(), Node::directory(path));
    Ok(())
}

/// Inserts without validation; only for entries copied from a valid tree.
fn graft(entries: &mut Entries, path: ArchivePath, asset: Option<AssetRef>) {
    ensure_parents(entries, &path);
    if asset.is_none() && entries.contains_key(&path) {
        return;
    }
    entries.insert(path.clone(), Node::new(path, asset));
}
