//! Archive Assembler
//!
//! Turns a [`Package`] into the output archive. The order of the steps is part
//! of the format contract:
//!
//! 1. prepare a clean staging area;
//! 2. stage `mimetype`;
//! 3. stage `META-INF/container.xml`;
//! 4. copy the cover and the gallery images;
//! 5. render and stage the navigation document, the package document, the cover,
//!    the index and every chapter;
//! 6. archive `mimetype` alone, uncompressed, as the very first entry;
//! 7. append every other staged file in a second pass;
//! 8. move the archive to its final name.
//!
//! ## Usage
//!
//! ```rust, no_run
//! # fn main() -> Result<(), epub_assembler::error::EpubError> {
//! use std::time::Duration;
//!
//! use epub_assembler::{
//!     archive::ZipArchiveWriter,
//!     assembler::{Assembler, AssemblerConfig},
//!     builder::PackageBuilder,
//!     types::Chapter,
//! };
//!
//! let mut builder = PackageBuilder::new();
//! builder
//!     .set_title("Example Title")
//!     .set_cover("cover.jpg")
//!     .add_chapter(Chapter::new("Chapter 1", "<p>Chapter 1 content</p>"));
//! let package = builder.build()?;
//!
//! let mut config = AssemblerConfig::new("assets");
//! config.set_output_dir("out").set_timeout(Duration::from_secs(30));
//!
//! let path = Assembler::new(config).assemble(&package, &mut ZipArchiveWriter::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Notes
//!
//! - The staging area and any partial archive are removed on every exit path,
//!   including errors, timeouts and cancellation.
//! - The final output path is only written once both archive passes succeeded.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{info, warn};
use rayon::prelude::*;

use crate::{
    archive::{ArchiveWriter, Compression, ZipArchiveWriter},
    error::EpubError,
    identifier::{CONTENT_DIR, COVERS_DIR, IMAGES_DIR, MIMETYPE_CONTENT, MIMETYPE_FILE},
    render::Document,
    staging::StagingArea,
    types::Package,
    utils::{CancelFlag, Watchdog, default_staging_root},
};

/// Assembler configuration
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Directory the cover and gallery image names are resolved against
    pub source_dir: PathBuf,

    /// Root of the staging area, exclusive to one build
    pub staging_root: PathBuf,

    /// Directory receiving the output archive
    pub output_dir: PathBuf,

    /// Upper bound for the whole build
    pub timeout: Option<Duration>,

    pub cancel: CancelFlag,
}

impl AssemblerConfig {
    /// Create a configuration reading assets from `source_dir`
    ///
    /// The staging root defaults to a fresh directory under the system temp
    /// directory, the output directory to the current directory, and there is
    /// no timeout.
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            staging_root: default_staging_root(),
            output_dir: PathBuf::from("."),
            timeout: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Set the staging root
    ///
    /// Anything already present at this path is deleted when a build starts.
    pub fn set_staging_root<P: AsRef<Path>>(&mut self, staging_root: P) -> &mut Self {
        self.staging_root = staging_root.as_ref().to_path_buf();
        self
    }

    pub fn set_output_dir<P: AsRef<Path>>(&mut self, output_dir: P) -> &mut Self {
        self.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share a cancel flag with the build
    pub fn set_cancel_flag(&mut self, cancel: CancelFlag) -> &mut Self {
        self.cancel = cancel;
        self
    }
}

/// Archive Assembler
pub struct Assembler {
    config: AssemblerConfig,
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Assemble `package` into an archive written through `writer`
    ///
    /// # Return
    /// - `Ok(PathBuf)`: Path of the output archive
    /// - `Err(EpubError)`: A step failed, the build timed out or was cancelled;
    ///   neither the staging area nor an output archive is left behind
    pub fn assemble<W: ArchiveWriter>(
        &self,
        package: &Package,
        writer: &mut W,
    ) -> Result<PathBuf, EpubError> {
        let watchdog = Watchdog::start(self.config.timeout, self.config.cancel.clone());
        info!(
            "Assembling '{}' in '{}'.",
            package.out_file_name,
            self.config.staging_root.display()
        );

        let staging = StagingArea::prepare(&self.config.staging_root)?;
        watchdog.check("prepare staging area")?;

        staging.write(MIMETYPE_FILE, MIMETYPE_CONTENT)?;
        staging.write(
            &Document::Container.path(),
            Document::Container.render(package)?,
        )?;
        watchdog.check("stage container")?;

        self.copy_assets(&staging, package)?;
        watchdog.check("copy assets")?;

        for document in Document::content_documents(package) {
            staging.write(&document.path(), document.render(package)?)?;
        }
        info!("Staged {} chapters.", package.chapters.len());
        watchdog.check("render documents")?;

        let target = self.config.output_dir.join(&package.out_file_name);
        if let Some(parent) = target.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut partial = PartialArchive::start(writer, partial_path(&target))?;
        Self::archive(&staging, &mut partial, &watchdog)?;
        partial.commit(&target)?;

        info!("Wrote '{}'.", target.display());
        Ok(target)
    }

    /// Copy the cover and the gallery images into the staging area
    ///
    /// Copies run on the rayon pool; all of them are joined before returning.
    fn copy_assets(&self, staging: &StagingArea, package: &Package) -> Result<(), EpubError> {
        let mut copies = Vec::new();
        if let Some(cover) = &package.cover {
            copies.push((cover, format!("{}/{}/{}", CONTENT_DIR, COVERS_DIR, cover)));
        }
        for image in &package.images {
            copies.push((image, format!("{}/{}/{}", CONTENT_DIR, IMAGES_DIR, image)));
        }

        copies
            .par_iter()
            .map(|(file_name, target)| {
                staging.copy_in(self.config.source_dir.join(file_name), target)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(())
    }

    /// Write the two archive passes
    fn archive<W: ArchiveWriter>(
        staging: &StagingArea,
        partial: &mut PartialArchive<'_, W>,
        watchdog: &Watchdog,
    ) -> Result<(), EpubError> {
        let path = partial.path.clone();
        let writer = &mut *partial.writer;

        writer.begin(&path)?;
        writer.append(
            MIMETYPE_FILE,
            &staging.read(MIMETYPE_FILE)?,
            Compression::Stored,
        )?;
        writer.finish()?;
        watchdog.check("archive mimetype")?;

        writer.begin(&path)?;
        for file in staging.files()? {
            if file == MIMETYPE_FILE {
                continue;
            }
            writer.append(&file, &staging.read(&file)?, Compression::Deflated)?;
        }
        writer.finish()?;
        watchdog.check("archive content")?;

        Ok(())
    }
}

/// Assemble `package` into a ZIP archive in the current directory
///
/// Cover and gallery images are resolved against `source_dir`.
pub fn assemble<P: AsRef<Path>>(package: &Package, source_dir: P) -> Result<PathBuf, EpubError> {
    Assembler::new(AssemblerConfig::new(source_dir)).assemble(package, &mut ZipArchiveWriter::new())
}

/// Archive written next to the target, moved into place on commit
///
/// Dropping an uncommitted partial archive discards it.
struct PartialArchive<'a, W: ArchiveWriter> {
    writer: &'a mut W,
    path: PathBuf,
    committed: bool,
}

impl<'a, W: ArchiveWriter> PartialArchive<'a, W> {
    /// Starts from a clean slate, since a stale partial archive would be appended to
    fn start(writer: &'a mut W, path: PathBuf) -> Result<Self, EpubError> {
        writer.discard(&path)?;

        Ok(Self {
            writer,
            path,
            committed: false,
        })
    }

    fn commit(&mut self, target: &Path) -> Result<(), EpubError> {
        self.writer.commit(&self.path, target)?;
        self.committed = true;

        Ok(())
    }
}

impl<W: ArchiveWriter> Drop for PartialArchive<'_, W> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        if let Err(err) = self.writer.discard(&self.path) {
            warn!(
                "Failed to remove partial archive '{}': {}",
                self.path.display(),
                err
            );
        }
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    target.with_file_name(format!(".{}.partial", file_name))
}
