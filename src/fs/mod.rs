mod archive_fs;
mod attributes;
mod stream;

pub use archive_fs::ArchiveFs;
pub use attributes::FileAttributes;
pub use stream::DirectoryStream;
