//! Error Type Definition Module
//!
//! This module defines the error types that may be encountered while
//! assembling an EPUB package. All errors are uniformly wrapped in the
//! `EpubError` enumeration for convenient error handling by the caller.
//!
//! ## Main Error Types
//!
//! - [EpubError] - Enumeration of the errors surfaced by every public operation
//! - [EpubBuilderError] - Errors specific to package validation, staging and archival

use std::path::Path;

use thiserror::Error;

/// Types of errors that can occur while assembling an EPUB
///
/// Underlying library failures (archive, XML, IO, directory walking) are wrapped
/// as they are, while failures that follow from the input or from the build
/// pipeline itself are reported through [EpubBuilderError].
#[derive(Debug, Error)]
pub enum EpubError {
    /// ZIP archive related errors
    ///
    /// Errors occur when the archive writer fails to create, reopen
    /// or finalize the output archive.
    #[error("Archive error: {source}")]
    ArchiveError { source: zip::result::ZipError },

    #[error("Epub builder error: {source}")]
    EpubBuilderError { source: EpubBuilderError },

    #[error("IO error: {source}")]
    IOError { source: std::io::Error },

    /// QuickXml error
    ///
    /// This error occurs when writing XML events into a rendered document.
    #[error("QuickXml error: {source}")]
    QuickXmlError { source: quick_xml::Error },

    /// UTF-8 decoding error
    ///
    /// This error occurs when a rendered document is not valid UTF-8.
    #[error("Decode error: {source}")]
    Utf8DecodeError { source: std::string::FromUtf8Error },

    /// WalkDir error
    ///
    /// This error occurs when traversing the staging directory for archival.
    #[error("WalkDir error: {source}")]
    WalkDirError { source: walkdir::Error },
}

impl From<zip::result::ZipError> for EpubError {
    fn from(value: zip::result::ZipError) -> Self {
        EpubError::ArchiveError { source: value }
    }
}

impl From<quick_xml::Error> for EpubError {
    fn from(value: quick_xml::Error) -> Self {
        EpubError::QuickXmlError { source: value }
    }
}

impl From<std::io::Error> for EpubError {
    fn from(value: std::io::Error) -> Self {
        EpubError::IOError { source: value }
    }
}

impl From<std::string::FromUtf8Error> for EpubError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        EpubError::Utf8DecodeError { source: value }
    }
}

impl From<EpubBuilderError> for EpubError {
    fn from(value: EpubBuilderError) -> Self {
        EpubError::EpubBuilderError { source: value }
    }
}

impl From<walkdir::Error> for EpubError {
    fn from(value: walkdir::Error) -> Self {
        EpubError::WalkDirError { source: value }
    }
}

#[cfg(test)]
impl PartialEq for EpubError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::EpubBuilderError { source: l_source },
                Self::EpubBuilderError { source: r_source },
            ) => l_source == r_source,
            (
                Self::Utf8DecodeError { source: l_source },
                Self::Utf8DecodeError { source: r_source },
            ) => l_source == r_source,

            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

/// Types of errors that can occur during an EPUB build
///
/// This enumeration covers invalid input, missing assets, staging failures,
/// archival misuse, and the build being stopped by its deadline or by a cancel flag.
#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq))]
pub enum EpubBuilderError {
    /// Asset not found error
    ///
    /// This error is triggered when a cover or gallery image referenced by the
    /// package does not exist in the source directory.
    #[error("Asset '{file_path}' does not exist in the source directory.")]
    AssetNotFound { file_path: String },

    /// Archive not started error
    ///
    /// This error is triggered when an entry is appended to an archive writer
    /// before `begin` was called, or after `finish`.
    #[error("Archive writer has no open archive.")]
    ArchiveNotStarted,

    /// Cancelled build error
    ///
    /// This error is triggered when the build's cancel flag was raised.
    #[error("Build cancelled during '{stage}'.")]
    Cancelled { stage: String },

    /// Chapter not found error
    ///
    /// This error is triggered when rendering a chapter index the package does not have.
    #[error("Chapter with index {index} does not exist in the package.")]
    ChapterNotFound { index: usize },

    /// Directory exists error
    ///
    /// This error is triggered when the staging sink is asked to create
    /// a directory that is already present.
    #[error("Directory '{path}' already exists.")]
    DirectoryExists { path: String },

    /// Duplicate manifest id error
    ///
    /// Asset manifest ids are derived by stripping the final extension of the
    /// file name, so `a.jpg` and `a.png` both map to `a`. Such collisions, and
    /// collisions with the ids of the generated documents, are refused.
    #[error("Manifest id '{manifest_id}' is used by more than one item.")]
    DuplicateManifestId { manifest_id: String },

    /// Illegal staging path error
    ///
    /// This error is triggered when a staging path is absolute or leaves the
    /// staging root through '..' components.
    #[error("Staging path '{path}' should be relative and stay inside the staging root.")]
    IllegalStagingPath { path: String },

    /// Missing required field error
    ///
    /// This error is triggered when the title is missing or empty,
    /// or when the package has no chapters.
    #[error("The required field '{field}' is missing or empty.")]
    MissingRequiredField { field: String },

    /// Permission denied error
    ///
    /// This error is triggered when the staging sink cannot read or write `path`.
    #[error("Permission denied for '{path}'.")]
    PermissionDenied { path: String },

    /// Timeout error
    ///
    /// This error is triggered when the build exceeds its configured timeout.
    #[error("Build timed out during '{stage}'.")]
    Timeout { stage: String },
}

impl EpubBuilderError {
    /// Classifies an io error raised while touching `path`
    ///
    /// Missing permissions and already existing directories get their own
    /// variants; every other failure stays a plain IO error.
    pub(crate) fn from_io(err: std::io::Error, path: &Path) -> EpubError {
        let path = path.to_string_lossy().to_string();
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                EpubBuilderError::PermissionDenied { path }.into()
            }
            std::io::ErrorKind::AlreadyExists => {
                EpubBuilderError::DirectoryExists { path }.into()
            }
            _ => err.into(),
        }
    }

    /// Classifies an io error raised while reading the asset at `path`
    ///
    /// Only here does a missing file mean a missing asset.
    pub(crate) fn from_asset_io(err: std::io::Error, path: &Path) -> EpubError {
        match err.kind() {
            std::io::ErrorKind::NotFound => EpubBuilderError::AssetNotFound {
                file_path: path.to_string_lossy().to_string(),
            }
            .into(),
            _ => EpubBuilderError::from_io(err, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io, path::Path};

    use crate::error::{EpubBuilderError, EpubError};

    #[test]
    fn test_from_io_classification() {
        let path = Path::new("covers/cover.jpg");

        let err = EpubBuilderError::from_io(io::Error::from(io::ErrorKind::NotFound), path);
        assert!(matches!(err, EpubError::IOError { .. }));

        assert_eq!(
            EpubBuilderError::from_io(io::Error::from(io::ErrorKind::PermissionDenied), path),
            EpubError::from(EpubBuilderError::PermissionDenied {
                path: "covers/cover.jpg".to_string()
            })
        );
        assert_eq!(
            EpubBuilderError::from_io(io::Error::from(io::ErrorKind::AlreadyExists), path),
            EpubError::from(EpubBuilderError::DirectoryExists {
                path: "covers/cover.jpg".to_string()
            })
        );

        let err = EpubBuilderError::from_io(io::Error::from(io::ErrorKind::Interrupted), path);
        assert!(matches!(err, EpubError::IOError { .. }));
    }

    #[test]
    fn test_from_asset_io_classification() {
        let path = Path::new("source/map.png");

        assert_eq!(
            EpubBuilderError::from_asset_io(io::Error::from(io::ErrorKind::NotFound), path),
            EpubError::from(EpubBuilderError::AssetNotFound {
                file_path: "source/map.png".to_string()
            })
        );
        assert_eq!(
            EpubBuilderError::from_asset_io(io::Error::from(io::ErrorKind::PermissionDenied), path),
            EpubError::from(EpubBuilderError::PermissionDenied {
                path: "source/map.png".to_string()
            })
        );
    }

    #[test]
    fn test_error_messages() {
        let err: EpubError = EpubBuilderError::MissingRequiredField {
            field: "title".to_string(),
        }
        .into();

        assert_eq!(
            err.to_string(),
            "Epub builder error: The required field 'title' is missing or empty."
        );
    }
}
