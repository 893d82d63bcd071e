use crate::ArchivePath;
use crate::archive::Filter;

/// Iterator over the immediate children of one directory, in insertion order.
///
/// The listing is taken when the stream is opened; later changes to the archive are not seen.
/// An optional [`Filter`] is applied while iterating.
#[derive(Debug)]
pub struct DirectoryStream {
    entries: std::vec::IntoIter<ArchivePath>,
    filter: Filter,
}

impl DirectoryStream {
    pub(crate) fn new(entries: Vec<ArchivePath>) -> Self {
        Self {
            entries: entries.into_iter(),
            filter: Filter::IncludeAll,
        }
    }

    /// Restricts the remaining entries to those accepted by `filter`.
    pub fn filtered(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

impl Iterator for DirectoryStream {
    type Item = ArchivePath;

    fn next(&mut self) -> Option<ArchivePath> {
        let filter = &self.filter;
        self.entries.by_ref().find(|path| filter.includes(path))
    }
}
