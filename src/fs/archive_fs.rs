//! This module provides a filesystem view over a shared in-memory archive.

use std::io::Read;

use crate::archive::{Node, SharedArchive};
use crate::core::{ArchiveError, FsBackend, Result, utils};
use crate::fs::{DirectoryStream, FileAttributes};
use crate::{ArchivePath, Asset};

/// A filesystem-like front end for a [`SharedArchive`].
///
/// `ArchiveFs` resolves `/`-separated string paths against a current working directory and
/// forwards every operation to the archive, so changes are visible to all other holders of the
/// same archive (and vice versa).
///
/// ### Internal state
///
/// * `archive`: the archive being viewed.
/// * `cwd`: Current Working Directory, an absolute normalized archive path.
///   - Determines how relative paths (e.g., `docs/file.txt`) are resolved.
///   - Default value: `/`.
///   - Changed via `cd()`.
///
/// `.` and `..` are resolved here only; the archive itself treats them as ordinary names.
///
/// ### Example
///
/// ```
/// use archive_kit::{Archive, ArchiveFs, FsBackend, SharedArchive};
///
/// let mut fs = ArchiveFs::new(SharedArchive::new(Archive::new("app.jar")));
///
/// fs.mkdir("/docs").unwrap();
/// fs.mkfile("/docs/note.txt", Some(b"Hello")).unwrap();
///
/// assert!(fs.exists("/docs/note.txt"));
///
/// fs.rm("/docs/note.txt").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveFs {
    archive: SharedArchive,
    cwd: ArchivePath,
}

impl ArchiveFs {
    /// Creates a view with the current working directory set to `/`.
    pub fn new(archive: SharedArchive) -> Self {
        Self {
            archive,
            cwd: ArchivePath::root(),
        }
    }

    pub fn archive(&self) -> &SharedArchive {
        &self.archive
    }

    fn to_inner<P: AsRef<str>>(&self, path: P) -> ArchivePath {
        let path = path.as_ref();
        if path.starts_with('/') {
            utils::normalize(&ArchivePath::new(path))
        } else {
            utils::normalize(&self.cwd.join(path))
        }
    }

    fn node(&self, inner: &ArchivePath) -> Result<Node> {
        self.archive
            .read()
            .get(inner)
            .ok_or_else(|| ArchiveError::NotFound(inner.clone()))
    }

    /// A directory, or a leaf holding a nested archive, both of which can be listed and entered.
    fn browsable(&self, inner: &ArchivePath) -> Result<bool> {
        let node = self.node(inner)?;
        Ok(node.is_dir() || node.asset().is_some_and(|asset| asset.as_archive().is_some()))
    }

    fn file_node(&self, inner: &ArchivePath) -> Result<Node> {
        let node = self.node(inner)?;
        if node.is_dir() {
            return Err(ArchiveError::IsADirectory(inner.clone()));
        }
        Ok(node)
    }
}

impl FsBackend for ArchiveFs {
    fn cwd(&self) -> &ArchivePath {
        &self.cwd
    }

    /// Changes the current working directory.
    /// * `path` can be in relative or absolute form, but in both cases it must exist.
    /// * A nested archive can be entered like a directory.
    fn cd<P: AsRef<str>>(&mut self, path: P) -> Result<()> {
        let target = self.to_inner(path);
        if !self.browsable(&target)? {
            return Err(ArchiveError::NotADirectory(target));
        }
        self.cwd = target;
        Ok(())
    }

    fn exists<P: AsRef<str>>(&self, path: P) -> bool {
        let inner = self.to_inner(path);
        self.archive.read().contains(inner)
    }

    fn is_dir<P: AsRef<str>>(&self, path: P) -> Result<bool> {
        let inner = self.to_inner(path);
        Ok(self.node(&inner)?.is_dir())
    }

    fn is_file<P: AsRef<str>>(&self, path: P) -> Result<bool> {
        let inner = self.to_inner(path);
        Ok(self.node(&inner)?.is_leaf())
    }

    /// Opens a stream over the **immediate children** of a directory.
    ///
    /// # Returns
    /// * `Ok(DirectoryStream)` - children in insertion order; the directory itself is not
    ///   included.
    /// * `Err(ArchiveError)` - If:
    ///   - `path` does not exist (`... does not exist`);
    ///   - `path` is a file (`... not a directory`).
    ///
    /// # Notes
    /// - **No recursion:** Unlike `tree()`, subdirectories are not traversed.
    /// - **Nested archives:** a nested archive, or a path reaching into one, lists that archive's
    ///   children.
    fn ls<P: AsRef<str>>(&self, path: P) -> Result<DirectoryStream> {
        let inner = self.to_inner(path);
        if !self.browsable(&inner)? {
            return Err(ArchiveError::NotADirectory(inner));
        }
        let children = self
            .archive
            .read()
            .children(&inner)
            .into_iter()
            .map(|node| node.path().clone())
            .collect();
        Ok(DirectoryStream::new(children))
    }

    /// Returns every path below `path`, depth first, excluding `path` itself.
    /// A file yields just itself.
    fn tree<P: AsRef<str>>(&self, path: P) -> Result<Vec<ArchivePath>> {
        let inner = self.to_inner(path);
        if !self.browsable(&inner)? {
            return Ok(vec![inner]);
        }

        let archive = self.archive.read();
        let mut found = Vec::new();
        let mut pending: Vec<Node> = archive.children(&inner).into_iter().rev().collect();
        while let Some(node) = pending.pop() {
            if node.is_dir() || node.asset().is_some_and(|asset| asset.as_archive().is_some()) {
                pending.extend(archive.children(node.path()).into_iter().rev());
            }
            found.push(node.path().clone());
        }
        Ok(found)
    }

    /// Creates a directory and all its parents (if needed).
    fn mkdir<P: AsRef<str>>(&mut self, path: P) -> Result<()> {
        if path.as_ref().is_empty() {
            return Err(ArchiveError::InvalidArgument("invalid path: empty".into()));
        }
        let inner = self.to_inner(path);
        if self.archive.read().contains(&inner) {
            return Err(ArchiveError::AlreadyExists(inner));
        }
        self.archive.write().add_as_directory(inner)?;
        Ok(())
    }

    /// Creates a new file. Missing parent directories are created.
    fn mkfile<P: AsRef<str>>(&mut self, file_path: P, content: Option<&[u8]>) -> Result<()> {
        let inner = self.to_inner(file_path);
        if self.archive.read().contains(&inner) {
            return Err(ArchiveError::AlreadyExists(inner));
        }
        let asset = match content {
            Some(content) => Asset::bytes(content.to_vec()),
            None => Asset::empty(),
        };
        self.archive.write().add(asset, inner)?;
        Ok(())
    }

    /// Reads the entire content of a file.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - the content; empty for empty files.
    /// * `Err(ArchiveError)` - If:
    ///   - the file does not exist (`... does not exist`);
    ///   - the path points to a directory (`... is a directory`);
    ///   - the asset's source cannot be read.
    fn read<P: AsRef<str>>(&self, path: P) -> Result<Vec<u8>> {
        let inner = self.to_inner(path);
        match self.file_node(&inner)?.asset() {
            Some(asset) => asset.read_all(),
            None => Ok(Vec::new()),
        }
    }

    fn open<P: AsRef<str>>(&self, path: P) -> Result<Box<dyn Read + Send>> {
        let inner = self.to_inner(path);
        match self.file_node(&inner)?.asset() {
            Some(asset) => asset.open_stream(),
            None => Ok(Box::new(std::io::empty())),
        }
    }

    /// Replaces the entire content of an existing file.
    /// The file must exist (use `mkfile()` first); its position in the archive is kept.
    fn write<P: AsRef<str>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let inner = self.to_inner(path);
        self.file_node(&inner)?;
        self.archive
            .write()
            .add(Asset::bytes(content.to_vec()), inner)?;
        Ok(())
    }

    /// Appends bytes to an existing file, preserving its old content.
    fn append<P: AsRef<str>>(&mut self, path: P, content: &[u8]) -> Result<()> {
        let inner = self.to_inner(path);
        let mut current = self.read(inner.as_str())?;
        current.extend_from_slice(content);
        self.archive.write().add(Asset::bytes(current), inner)?;
        Ok(())
    }

    /// Removes a file or a directory with all its contents.
    fn rm<P: AsRef<str>>(&mut self, path: P) -> Result<()> {
        if path.as_ref().is_empty() {
            return Err(ArchiveError::InvalidArgument("invalid path: empty".into()));
        }
        let inner = self.to_inner(path);
        if inner.is_root() {
            return Err(ArchiveError::InvalidArgument(
                "invalid path: the root cannot be removed".into(),
            ));
        }
        self.archive
            .write()
            .delete(&inner)
            .ok_or(ArchiveError::NotFound(inner))?;
        Ok(())
    }

    /// Moves a file or directory (with its contents) to a new path.
    fn mv<P: AsRef<str>, Q: AsRef<str>>(&mut self, from: P, to: Q) -> Result<()> {
        let from = self.to_inner(from);
        let to = self.to_inner(to);
        if !self.archive.read().contains(&from) {
            return Err(ArchiveError::NotFound(from));
        }
        self.archive.write().mv(from, to)
    }

    fn attributes<P: AsRef<str>>(&self, path: P) -> FileAttributes {
        FileAttributes::new(self.archive.clone(), self.to_inner(path))
    }

    /// Removes all entries, preserving the root.
    fn cleanup(&mut self) -> bool {
        self.archive.write().delete(ArchivePath::root());
        self.cwd = ArchivePath::root();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Archive, ArchiveFormat};

    /// Helper to set up a test view with a predefined structure
    fn setup_test_fs() -> ArchiveFs {
        let mut fs = ArchiveFs::new(SharedArchive::new(Archive::new("test.jar")));

        fs.mkdir("/home").unwrap();
        fs.mkdir("/home/user").unwrap();
        fs.mkdir("/etc").unwrap();
        fs.mkfile("/home/user/config.txt", Some(b"Config content"))
            .unwrap();
        fs.mkfile("/readme.md", Some(b"Project docs")).unwrap();

        fs
    }

    fn names(stream: DirectoryStream) -> Vec<String> {
        stream.map(|p| p.as_str().to_string()).collect()
    }

    mod cd {
        use super::*;

        #[test]
        fn test_cd_absolute_and_relative() -> Result<()> {
            let mut fs = setup_test_fs();
            assert!(fs.cwd().is_root());

            fs.cd("/home")?;
            assert_eq!(fs.cwd().as_str(), "/home");

            fs.cd("user")?;
            assert_eq!(fs.cwd().as_str(), "/home/user");

            fs.cd("../..")?;
            assert!(fs.cwd().is_root());
            Ok(())
        }

        #[test]
        fn test_cd_with_trailing_slash() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.cd("/home/user//")?;
            assert_eq!(fs.cwd().as_str(), "/home/user");
            Ok(())
        }

        #[test]
        fn test_cd_nonexistent_path_error() {
            let mut fs = setup_test_fs();
            let result = fs.cd("/nonexistent/path");
            assert!(result.unwrap_err().to_string().contains("does not exist"));
            assert!(fs.cwd().is_root());
        }

        #[test]
        fn test_cd_file_path_error() {
            let mut fs = setup_test_fs();
            let result = fs.cd("/home/user/config.txt");
            assert!(
                result.unwrap_err().to_string().contains("not a directory"),
                "Even though the file exists, cd() should fail because it's not a directory"
            );
            assert!(fs.cwd().is_root());
        }
    }

    mod exists {
        use super::*;

        #[test]
        fn test_exists_paths() {
            let mut fs = setup_test_fs();
            assert!(fs.exists("/"));
            assert!(fs.exists(""));
            assert!(fs.exists("/home/user/config.txt"));
            assert!(fs.exists("home/user/"));
            assert!(fs.exists("./home"));
            assert!(!fs.exists("/home/us"));
            assert!(!fs.exists("/tmp"));

            fs.cd("/home/user").unwrap();
            assert!(fs.exists("config.txt"));
            assert!(fs.exists("../../etc"));
        }

        #[test]
        fn test_is_dir_and_is_file() -> Result<()> {
            let fs = setup_test_fs();
            assert!(fs.is_dir("/home")?);
            assert!(!fs.is_file("/home")?);
            assert!(fs.is_file("/readme.md")?);
            assert!(matches!(fs.is_dir("/nope"), Err(ArchiveError::NotFound(_))));
            Ok(())
        }
    }

    mod ls {
        use super::*;

        #[test]
        fn test_ls_immediate_children_in_order() -> Result<()> {
            let fs = setup_test_fs();
            assert_eq!(names(fs.ls("/")?), ["/home", "/etc", "/readme.md"]);
            assert_eq!(names(fs.ls("/home")?), ["/home/user"]);
            assert!(names(fs.ls("/etc")?).is_empty());
            Ok(())
        }

        #[test]
        fn test_ls_relative_to_cwd() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.cd("/home")?;
            assert_eq!(names(fs.ls("user")?), ["/home/user/config.txt"]);
            assert_eq!(names(fs.ls("")?), ["/home/user"]);
            Ok(())
        }

        #[test]
        fn test_ls_file_is_not_a_directory() {
            let fs = setup_test_fs();
            assert!(matches!(fs.ls("/readme.md"), Err(ArchiveError::NotADirectory(_))));
            assert!(matches!(fs.ls("/missing"), Err(ArchiveError::NotFound(_))));
        }

        #[test]
        fn test_ls_inside_nested_archive() -> Result<()> {
            let child = SharedArchive::new(Archive::new("child.jar"));
            child.write().add(Asset::text("x"), "/pkg/x.txt")?;
            let fs = setup_test_fs();
            fs.archive()
                .write()
                .add_archive(&child, "/lib", ArchiveFormat::Zip)?;

            assert_eq!(names(fs.ls("/lib/child.jar/pkg")?), ["/lib/child.jar/pkg/x.txt"]);
            assert_eq!(fs.read("/lib/child.jar/pkg/x.txt")?, b"x");
            Ok(())
        }

        #[test]
        fn test_cd_and_ls_nested_archive_root() -> Result<()> {
            let child = SharedArchive::new(Archive::new("child.jar"));
            child
                .write()
                .add(Asset::text("x"), "/pkg/x.txt")?
                .add(Asset::text("y"), "/y.txt")?;
            let mut fs = setup_test_fs();
            fs.archive()
                .write()
                .add_archive(&child, "/lib", ArchiveFormat::Zip)?;

            assert_eq!(
                names(fs.ls("/lib/child.jar")?),
                ["/lib/child.jar/pkg", "/lib/child.jar/y.txt"]
            );
            assert_eq!(
                fs.tree("/lib")?,
                [
                    ArchivePath::new("/lib/child.jar"),
                    ArchivePath::new("/lib/child.jar/pkg"),
                    ArchivePath::new("/lib/child.jar/pkg/x.txt"),
                    ArchivePath::new("/lib/child.jar/y.txt"),
                ]
            );

            fs.cd("/lib/child.jar")?;
            assert_eq!(fs.cwd().as_str(), "/lib/child.jar");
            assert_eq!(names(fs.ls(".")?), ["/lib/child.jar/pkg", "/lib/child.jar/y.txt"]);
            assert_eq!(fs.read("y.txt")?, b"y");
            fs.cd("pkg")?;
            assert_eq!(fs.read("x.txt")?, b"x");
            Ok(())
        }
    }

    mod tree {
        use super::*;

        #[test]
        fn test_tree_depth_first() -> Result<()> {
            let fs = setup_test_fs();
            let all: Vec<String> = fs.tree("/")?.iter().map(|p| p.to_string()).collect();
            assert_eq!(
                all,
                ["/home", "/home/user", "/home/user/config.txt", "/etc", "/readme.md"]
            );

            let file = fs.tree("/readme.md")?;
            assert_eq!(file, [ArchivePath::new("/readme.md")]);
            Ok(())
        }
    }

    mod mkdir_mkfile {
        use super::*;

        #[test]
        fn test_mkdir_creates_parents() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.mkdir("/a/b/c")?;
            assert!(fs.is_dir("/a")?);
            assert!(fs.is_dir("/a/b")?);
            assert!(fs.is_dir("/a/b/c")?);
            Ok(())
        }

        #[test]
        fn test_mkdir_existing_or_empty_fails() {
            let mut fs = setup_test_fs();
            assert!(matches!(fs.mkdir("/home"), Err(ArchiveError::AlreadyExists(_))));
            assert!(matches!(fs.mkdir(""), Err(ArchiveError::InvalidArgument(_))));
        }

        #[test]
        fn test_mkfile_under_file_fails() {
            let mut fs = setup_test_fs();
            let result = fs.mkfile("/readme.md/inner", None);
            assert!(matches!(result, Err(ArchiveError::IllegalPath { .. })));
        }

        #[test]
        fn test_mkfile_empty() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.mkfile("/new/empty.txt", None)?;
            assert!(fs.read("/new/empty.txt")?.is_empty());
            assert!(matches!(
                fs.mkfile("/new/empty.txt", None),
                Err(ArchiveError::AlreadyExists(_))
            ));
            Ok(())
        }
    }

    mod read_write {
        use super::*;

        #[test]
        fn test_read() -> Result<()> {
            let fs = setup_test_fs();
            assert_eq!(fs.read("/home/user/config.txt")?, b"Config content");
            assert!(matches!(fs.read("/home"), Err(ArchiveError::IsADirectory(_))));
            assert!(matches!(fs.read("/nope"), Err(ArchiveError::NotFound(_))));
            Ok(())
        }

        #[test]
        fn test_open() -> Result<()> {
            let fs = setup_test_fs();
            let mut content = String::new();
            fs.open("readme.md")?.read_to_string(&mut content)?;
            assert_eq!(content, "Project docs");
            Ok(())
        }

        #[test]
        fn test_write_replaces_content_in_place() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.write("/readme.md", b"New docs")?;
            assert_eq!(fs.read("/readme.md")?, b"New docs");
            assert_eq!(names(fs.ls("/")?), ["/home", "/etc", "/readme.md"]);

            assert!(matches!(fs.write("/nope", b"x"), Err(ArchiveError::NotFound(_))));
            assert!(matches!(fs.write("/etc", b"x"), Err(ArchiveError::IsADirectory(_))));
            Ok(())
        }

        #[test]
        fn test_append() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.append("/readme.md", b" and more")?;
            assert_eq!(fs.read("/readme.md")?, b"Project docs and more");
            assert!(fs.append("/missing", b"x").is_err());
            Ok(())
        }
    }

    mod rm_mv {
        use super::*;

        #[test]
        fn test_rm_recursive() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.rm("/home")?;
            assert!(!fs.exists("/home"));
            assert!(!fs.exists("/home/user/config.txt"));
            assert!(fs.exists("/etc"));
            Ok(())
        }

        #[test]
        fn test_rm_errors() {
            let mut fs = setup_test_fs();
            assert!(matches!(fs.rm("/nope"), Err(ArchiveError::NotFound(_))));
            assert!(matches!(fs.rm(""), Err(ArchiveError::InvalidArgument(_))));
            for root in ["/", ".", "/..", "home/..", "/home/user/../.."] {
                let err = fs.rm(root).unwrap_err();
                assert!(err.to_string().contains("the root cannot be removed"));
            }
            assert!(fs.exists("/readme.md"));
            assert!(fs.exists("/home/user/config.txt"));

            fs.cd("/home").unwrap();
            assert!(fs.rm("..").is_err());
            assert!(fs.exists("/readme.md"));
        }

        #[test]
        fn test_mv() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.mv("/home/user", "/users/admin")?;
            assert_eq!(fs.read("/users/admin/config.txt")?, b"Config content");
            assert!(!fs.exists("/home/user"));
            assert!(matches!(fs.mv("/nope", "/x"), Err(ArchiveError::NotFound(_))));
            Ok(())
        }

        #[test]
        fn test_cleanup() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.cd("/home")?;
            assert!(fs.cleanup());
            assert!(fs.cwd().is_root());
            assert!(fs.archive().read().is_empty());
            assert!(fs.exists("/"));
            Ok(())
        }
    }

    mod attributes {
        use super::*;

        #[test]
        fn test_attributes_follow_cwd() -> Result<()> {
            let mut fs = setup_test_fs();
            fs.cd("/home/user")?;
            let attributes = fs.attributes("config.txt");
            assert_eq!(attributes.path().as_str(), "/home/user/config.txt");
            assert!(attributes.is_regular_file());
            assert_eq!(attributes.size()?, 14);
            Ok(())
        }
    }

    #[test]
    fn test_changes_visible_through_archive() -> Result<()> {
        let shared = SharedArchive::new(Archive::new("shared.jar"));
        let mut fs = ArchiveFs::new(shared.clone());
        fs.mkfile("/from-fs.txt", Some(b"fs"))?;
        shared.write().add(Asset::text("archive"), "/from-archive.txt")?;

        assert!(shared.read().contains("/from-fs.txt"));
        assert_eq!(fs.read("/from-archive.txt")?, b"archive");
        Ok(())
    }
}
