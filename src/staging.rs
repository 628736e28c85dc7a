//! Staging Area
//!
//! A scratch directory tree mirroring the final archive layout. The staging
//! area owns its root exclusively: any tree already present at the root is
//! removed when the area is prepared, and the root is removed again when the
//! area is dropped, whether the build succeeded, failed or was cancelled.
//!
//! ## Notes
//!
//! - Two builds must not share a staging root; preparing one wipes the other.
//! - Every path handed to the staging area is relative to its root and may
//!   not leave it.

use std::{
    fs::{self, File},
    io,
    path::{Component, Path, PathBuf},
};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{EpubBuilderError, EpubError};

/// Staging Area
///
/// Filesystem sink for every file that ends up in the archive.
#[derive(Debug)]
pub struct StagingArea {
    /// Root directory of the staged tree
    root: PathBuf,
}

impl StagingArea {
    /// Prepare a clean staging area at `root`
    ///
    /// A tree already present at `root` is removed first, so a re-run never
    /// picks up entries of a previous build.
    ///
    /// # Return
    /// - `Ok(StagingArea)`: The empty staging area
    /// - `Err(EpubError)`: The stale tree could not be removed or the root could not be created
    pub fn prepare<P: AsRef<Path>>(root: P) -> Result<Self, EpubError> {
        let root = root.as_ref().to_path_buf();

        if root.exists() {
            debug!("Removing stale staging area '{}'.", root.display());
            fs::remove_dir_all(&root).map_err(|err| EpubBuilderError::from_io(err, &root))?;
        }

        fs::create_dir_all(&root).map_err(|err| EpubBuilderError::from_io(err, &root))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a directory inside the staging area
    ///
    /// Fails with `DirectoryExists` when the directory is already present.
    pub fn create_dir(&self, relative: &str) -> Result<PathBuf, EpubError> {
        let target = self.resolve(relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| EpubBuilderError::from_io(err, parent))?;
        }
        fs::create_dir(&target).map_err(|err| EpubBuilderError::from_io(err, &target))?;

        Ok(target)
    }

    /// Write `data` to `relative`, creating missing parent directories
    pub fn write(&self, relative: &str, data: impl AsRef<[u8]>) -> Result<PathBuf, EpubError> {
        let target = self.resolve(relative)?;
        self.ensure_parent(&target)?;

        fs::write(&target, data).map_err(|err| EpubBuilderError::from_io(err, &target))?;
        debug!("Staged '{}'.", relative);

        Ok(target)
    }

    /// Copy the external file `source` to `relative`
    ///
    /// A missing source fails with `AssetNotFound`. Failures are reported
    /// against the side they occurred on, the source or the staged copy.
    pub fn copy_in<P: AsRef<Path>>(&self, source: P, relative: &str) -> Result<PathBuf, EpubError> {
        let source = source.as_ref();
        if !source.is_file() {
            return Err(EpubBuilderError::AssetNotFound {
                file_path: source.to_string_lossy().to_string(),
            }
            .into());
        }

        let target = self.resolve(relative)?;
        self.ensure_parent(&target)?;

        let mut reader =
            File::open(source).map_err(|err| EpubBuilderError::from_asset_io(err, source))?;
        let mut writer =
            File::create(&target).map_err(|err| EpubBuilderError::from_io(err, &target))?;
        io::copy(&mut reader, &mut writer)?;
        debug!("Copied '{}' to '{}'.", source.display(), relative);

        Ok(target)
    }

    /// All staged files, as `/`-separated paths relative to the root, sorted by name
    pub fn files(&self) -> Result<Vec<String>, EpubError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).map_err(|_| {
                EpubBuilderError::IllegalStagingPath {
                    path: entry.path().to_string_lossy().to_string(),
                }
            })?;
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }

        Ok(files)
    }

    /// Read back a staged file
    pub fn read(&self, relative: &str) -> Result<Vec<u8>, EpubError> {
        let target = self.resolve(relative)?;
        fs::read(&target).map_err(|err| EpubBuilderError::from_io(err, &target))
    }

    /// Resolves `relative` against the root, refusing paths that escape it
    fn resolve(&self, relative: &str) -> Result<PathBuf, EpubError> {
        let path = Path::new(relative);
        let escapes = relative.is_empty()
            || path
                .components()
                .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));

        if escapes {
            return Err(EpubBuilderError::IllegalStagingPath {
                path: relative.to_string(),
            }
            .into());
        }

        Ok(self.root.join(path))
    }

    fn ensure_parent(&self, target: &Path) -> Result<(), EpubError> {
        if let Some(parent) = target.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|err| EpubBuilderError::from_io(err, parent))?;
            }
        }

        Ok(())
    }
}

impl Drop for StagingArea {
    /// Remove the staging area when dropped
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.root) {
            warn!(
                "Failed to remove staging area '{}': {}",
                self.root.display(),
                err
            );
        }
    }
}
