use std::io::{self, Cursor, Read};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::codec::{ArchiveFormat, ExportOptions, ZipCompression};
use crate::core::{ArchiveError, BoxError, CodecOp, Result};
use crate::{Archive, Asset};

fn export_error<E: Into<BoxError>>(entry: &str, source: E) -> ArchiveError {
    ArchiveError::codec(CodecOp::Export, ArchiveFormat::Zip, entry, source)
}

fn import_error<E: Into<BoxError>>(entry: &str, source: E) -> ArchiveError {
    ArchiveError::codec(CodecOp::Import, ArchiveFormat::Zip, entry, source)
}

pub(super) fn export(archive: &Archive, options: &ExportOptions) -> Result<Vec<u8>> {
    let method = match options.zip_compression() {
        ZipCompression::Stored => CompressionMethod::Stored,
        ZipCompression::Deflated => CompressionMethod::Deflated,
    };
    let file_options = SimpleFileOptions::default().compression_method(method);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (path, node) in archive.content() {
        let entry = path.relative();
        match node.asset() {
            None => writer
                .add_directory(format!("{entry}/"), file_options)
                .map_err(|e| export_error(entry, e))?,
            Some(asset) => {
                writer
                    .start_file(entry, file_options)
                    .map_err(|e| export_error(entry, e))?;
                let mut stream = asset.open_stream().map_err(|e| export_error(entry, e))?;
                io::copy(&mut stream, &mut writer).map_err(|e| export_error(entry, e))?;
            }
        }
    }

    let cursor = writer
        .finish()
        .map_err(|e| export_error("<central directory>", e))?;
    Ok(cursor.into_inner())
}

/// The central directory sits at the end of the stream, so the whole stream is buffered first.
/// Entries are then visited in central-directory order, which is the order they were written.
pub(super) fn import<R: Read>(archive: &mut Archive, mut reader: R) -> Result<()> {
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .map_err(|e| import_error("<stream>", e))?;
    let mut zip = ZipArchive::new(Cursor::new(content))
        .map_err(|e| import_error("<central directory>", e))?;

    for index in 0..zip.len() {
        let mut file = zip
            .by_index(index)
            .map_err(|e| import_error(&format!("#{index}"), e))?;
        let name = file.name().to_string();
        if file.is_dir() {
            archive
                .add_as_directory(name.as_str())
                .map_err(|e| import_error(&name, e))?;
            continue;
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| import_error(&name, e))?;
        archive
            .add(Asset::bytes(data), name.as_str())
            .map_err(|e| import_error(&name, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<Archive> {
        let mut archive = Archive::new("sample.zip");
        archive
            .add(Asset::text("a".repeat(512)), "/dir/a.txt")?
            .add_as_directory("/empty")?;
        Ok(archive)
    }

    #[test]
    fn test_entry_names_are_relative() -> Result<()> {
        let exported = export(&sample()?, &ExportOptions::default())?;
        let zip = ZipArchive::new(Cursor::new(exported)).unwrap();
        let names: Vec<&str> = zip.file_names().collect();
        assert!(names.contains(&"dir/"));
        assert!(names.contains(&"dir/a.txt"));
        assert!(names.contains(&"empty/"));
        assert!(names.iter().all(|n| !n.starts_with('/')));
        Ok(())
    }

    #[test]
    fn test_compression_method() -> Result<()> {
        let archive = sample()?;
        for (compression, method) in [
            (ZipCompression::Stored, CompressionMethod::Stored),
            (ZipCompression::Deflated, CompressionMethod::Deflated),
        ] {
            let mut options = ExportOptions::default();
            options.set_zip_compression(compression);
            let exported = export(&archive, &options)?;

            let mut zip = ZipArchive::new(Cursor::new(exported)).unwrap();
            let file = zip.by_name("dir/a.txt").unwrap();
            assert_eq!(file.compression(), method);
        }
        Ok(())
    }

    #[test]
    fn test_conflicting_entries_fail() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("a", options).unwrap();
        writer.start_file("a/b", options).unwrap();
        let content = writer.finish().unwrap().into_inner();

        let mut archive = Archive::new("conflict.zip");
        match import(&mut archive, Cursor::new(content)) {
            Err(ArchiveError::Codec { entry, .. }) => assert_eq!(entry, "a/b"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
