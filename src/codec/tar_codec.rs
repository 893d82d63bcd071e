use std::io::{self, Read, Write};

use tar::{Builder, EntryType, Header};

use crate::codec::ArchiveFormat;
use crate::core::{ArchiveError, BoxError, CodecOp, Result};
use crate::{Archive, Asset};

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// Writes every entry into `writer` and hands the writer back, so a compressing writer can be
/// finished by the caller. Leaf content is buffered to learn its size for the header.
pub(super) fn export<W: Write>(archive: &Archive, format: ArchiveFormat, writer: W) -> Result<W> {
    let fail = |entry: &str, e: BoxError| ArchiveError::codec(CodecOp::Export, format, entry, e);
    let mut builder = Builder::new(writer);

    for (path, node) in archive.content() {
        let entry = path.relative();
        let mut header = Header::new_gnu();
        match node.asset() {
            None => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(DIR_MODE);
                header.set_size(0);
                builder
                    .append_data(&mut header, format!("{entry}/"), io::empty())
                    .map_err(|e| fail(entry, e.into()))?;
            }
            Some(asset) => {
                let content = asset.read_all().map_err(|e| fail(entry, e.into()))?;
                header.set_entry_type(EntryType::Regular);
                header.set_mode(FILE_MODE);
                header.set_size(content.len() as u64);
                builder
                    .append_data(&mut header, entry, content.as_slice())
                    .map_err(|e| fail(entry, e.into()))?;
            }
        }
    }

    builder
        .into_inner()
        .map_err(|e| fail("<end of archive>", e.into()))
}

/// Reads headers sequentially. Entries other than files and directories are skipped.
pub(super) fn import<R: Read>(
    archive: &mut Archive,
    format: ArchiveFormat,
    reader: R,
) -> Result<()> {
    let fail = |entry: &str, e: BoxError| ArchiveError::codec(CodecOp::Import, format, entry, e);
    let mut tar = tar::Archive::new(reader);
    let entries = tar.entries().map_err(|e| fail("<header>", e.into()))?;

    let mut last = String::from("<start>");
    for entry in entries {
        let mut entry = entry.map_err(|e| fail(&format!("after {last}"), e.into()))?;
        let name = entry
            .path()
            .map_err(|e| fail(&format!("after {last}"), e.into()))?
            .to_string_lossy()
            .into_owned();
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            archive
                .add_as_directory(name.as_str())
                .map_err(|e| fail(&name, e.into()))?;
        } else if kind.is_file() {
            // untrusted size: verified after reading, never used to preallocate
            let declared = entry.size();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| fail(&name, e.into()))?;
            if data.len() as u64 != declared {
                let truncated = format!("truncated entry: {} of {declared} bytes", data.len());
                return Err(fail(&name, truncated.into()));
            }
            archive
                .add(Asset::bytes(data), name.as_str())
                .map_err(|e| fail(&name, e.into()))?;
        } else {
            tracing::warn!(
                archive = %archive.name(),
                entry = %name,
                kind = ?kind,
                "skipping tar entry"
            );
        }
        last = name;
    }
    Ok(())
}
