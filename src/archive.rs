//! Archive writers
//!
//! The assembler writes the output archive in two sequential passes against
//! the same file: the stored `mimetype` entry alone, then everything else.
//! [`ArchiveWriter`] is the seam between the assembler and the archive format;
//! [`ZipArchiveWriter`] writes real ZIP files and [`MemoryArchive`] only records
//! what it was asked to write.

use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::debug;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::error::{EpubBuilderError, EpubError};

/// Compression mode of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Written as is, required for the `mimetype` entry
    Stored,
    Deflated,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// Sink for archive entries
///
/// A pass is `begin`, any number of `append`, then `finish`. A second pass
/// against the same target appends after the entries of the first one.
pub trait ArchiveWriter {
    /// Open `target` for a new pass, creating it when it does not exist yet
    fn begin(&mut self, target: &Path) -> Result<(), EpubError>;

    /// Append the entry `name` with the chosen compression
    fn append(
        &mut self,
        name: &str,
        data: &[u8],
        compression: Compression,
    ) -> Result<(), EpubError>;

    /// Close the current pass
    fn finish(&mut self) -> Result<(), EpubError>;

    /// Move a completed archive to its final location
    fn commit(&mut self, partial: &Path, target: &Path) -> Result<(), EpubError> {
        fs::rename(partial, target)?;
        Ok(())
    }

    /// Remove an archive that will never be committed
    fn discard(&mut self, partial: &Path) -> Result<(), EpubError> {
        remove_if_exists(partial)
    }
}

fn remove_if_exists(path: &Path) -> Result<(), EpubError> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}

/// ZIP archive writer backed by the `zip` crate
#[derive(Default)]
pub struct ZipArchiveWriter {
    zip: Option<ZipWriter<File>>,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn begin(&mut self, target: &Path) -> Result<(), EpubError> {
        let zip = if target.exists() {
            let file = OpenOptions::new().read(true).write(true).open(target)?;
            ZipWriter::new_append(file)?
        } else {
            ZipWriter::new(File::create(target)?)
        };

        debug!("Opened archive '{}'.", target.display());
        self.zip = Some(zip);
        Ok(())
    }

    fn append(
        &mut self,
        name: &str,
        data: &[u8],
        compression: Compression,
    ) -> Result<(), EpubError> {
        let zip = self
            .zip
            .as_mut()
            .ok_or(EpubBuilderError::ArchiveNotStarted)?;

        let options = SimpleFileOptions::default().compression_method(compression.into());
        zip.start_file(name, options)?;
        zip.write_all(data)?;

        Ok(())
    }

    fn finish(&mut self) -> Result<(), EpubError> {
        let zip = self.zip.take().ok_or(EpubBuilderError::ArchiveNotStarted)?;
        zip.finish()?;

        Ok(())
    }

    fn discard(&mut self, partial: &Path) -> Result<(), EpubError> {
        // An unfinished pass still holds the file open.
        drop(self.zip.take());
        remove_if_exists(partial)
    }
}

/// An entry recorded by [`MemoryArchive`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: Compression,

    /// 1-based number of the pass that wrote the entry
    pub pass: usize,
}

/// In-memory archive writer
///
/// Records entries instead of writing a file, which makes the assembler's
/// output inspectable without touching a ZIP file.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    pub entries: Vec<MemoryEntry>,

    /// Number of passes started so far
    pub passes: usize,

    /// Target of the last commit
    pub committed: Option<PathBuf>,

    open: bool,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, name: &str) -> Option<&MemoryEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

impl ArchiveWriter for MemoryArchive {
    fn begin(&mut self, _target: &Path) -> Result<(), EpubError> {
        self.passes += 1;
        self.open = true;
        Ok(())
    }

    fn append(
        &mut self,
        name: &str,
        data: &[u8],
        compression: Compression,
    ) -> Result<(), EpubError> {
        if !self.open {
            return Err(EpubBuilderError::ArchiveNotStarted.into());
        }

        self.entries.push(MemoryEntry {
            name: name.to_string(),
            data: data.to_vec(),
            compression,
            pass: self.passes,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EpubError> {
        if !self.open {
            return Err(EpubBuilderError::ArchiveNotStarted.into());
        }

        self.open = false;
        Ok(())
    }

    fn commit(&mut self, _partial: &Path, target: &Path) -> Result<(), EpubError> {
        self.committed = Some(target.to_path_buf());
        Ok(())
    }

    fn discard(&mut self, _partial: &Path) -> Result<(), EpubError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Read, path::Path};

    use zip::{CompressionMethod, ZipArchive};

    use crate::{
        archive::{ArchiveWriter, Compression, MemoryArchive, ZipArchiveWriter},
        error::{EpubBuilderError, EpubError},
    };

    #[test]
    fn test_zip_writer_two_passes() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("two-pass.zip");

        let mut writer = ZipArchiveWriter::new();
        writer.begin(&target).unwrap();
        writer
            .append("mimetype", b"application/epub+zip", Compression::Stored)
            .unwrap();
        writer.finish().unwrap();

        writer.begin(&target).unwrap();
        writer
            .append("EPUB/index.xhtml", b"<html></html>", Compression::Deflated)
            .unwrap();
        writer.finish().unwrap();

        let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        drop(first);

        let mut second = archive.by_index(1).unwrap();
        assert_eq!(second.name(), "EPUB/index.xhtml");
        assert_eq!(second.compression(), CompressionMethod::Deflated);

        let mut content = String::new();
        second.read_to_string(&mut content).unwrap();
        assert_eq!(content, "<html></html>");
    }

    #[test]
    fn test_zip_writer_append_without_begin() {
        let mut writer = ZipArchiveWriter::new();

        assert_eq!(
            writer
                .append("mimetype", b"application/epub+zip", Compression::Stored)
                .unwrap_err(),
            EpubError::from(EpubBuilderError::ArchiveNotStarted)
        );
        assert!(writer.finish().is_err());
    }

    #[test]
    fn test_discard_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let mut writer = ZipArchiveWriter::new();

        assert!(writer.discard(&temp.path().join("never-written.zip")).is_ok());
    }

    #[test]
    fn test_memory_archive_records_passes() {
        let mut archive = MemoryArchive::new();
        let target = Path::new("book.epub.partial");

        archive.begin(target).unwrap();
        archive.append("mimetype", b"application/epub+zip", Compression::Stored).unwrap();
        archive.finish().unwrap();
        archive.begin(target).unwrap();
        archive.append("EPUB/toc.xhtml", b"<html/>", Compression::Deflated).unwrap();
        archive.finish().unwrap();
        archive.commit(target, Path::new("book.epub")).unwrap();

        assert_eq!(archive.passes, 2);
        assert_eq!(archive.entry("mimetype").unwrap().pass, 1);
        assert_eq!(archive.entry("EPUB/toc.xhtml").unwrap().pass, 2);
        assert_eq!(archive.committed.as_deref(), Some(Path::new("book.epub")));
        assert!(archive.append("late", b"", Compression::Deflated).is_err());
    }
}
