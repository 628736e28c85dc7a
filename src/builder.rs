//! Package Builder
//!
//! This module normalizes user input into the [`Package`] tree consumed by the
//! renderer and the assembler. Optional attributes receive their defaults here,
//! the build timestamps are captured exactly once, and input that would produce
//! a broken package is refused before anything touches the filesystem.
//!
//! ## Usage
//!
//! ```rust, no_run
//! # fn main() -> Result<(), epub_assembler::error::EpubError> {
//! use epub_assembler::{
//!     builder::PackageBuilder,
//!     types::{Chapter, Section},
//! };
//!
//! let mut builder = PackageBuilder::new();
//! builder
//!     .set_title("Example Title")
//!     .set_author("John", "Doe")
//!     .set_cover("cover.jpg")
//!     .add_chapter(
//!         Chapter::new("Chapter 1", "<p>Chapter 1 content</p>")
//!             .with_section(Section::new("Section 1.1", "<p>Section 1.1 content</p>")),
//!     );
//!
//! let package = builder.build()?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use log::info;
use sha1::{Digest, Sha1};

use crate::{
    error::{EpubBuilderError, EpubError},
    render::opf::manifest,
    types::{Chapter, Package, Timestamps},
};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_OUT_FILE_NAME: &str = "book.epub";

/// Raw book description
///
/// Every field is optional so the options can be filled piecemeal or
/// deserialized (with the `serde` feature) from any configuration format.
/// `title` and `chapters` are nevertheless required by [`PackageBuilder::build`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EpubOptions {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub creator: Option<String>,
    pub author_firstname: Option<String>,
    pub author_surname: Option<String>,
    pub publisher: Option<String>,
    pub copyright: Option<String>,
    pub language: Option<String>,
    pub out_file_name: Option<String>,

    /// Cover image file name, relative to the source directory
    pub cover: Option<String>,

    /// Gallery image file names, relative to the source directory
    pub images: Vec<String>,

    pub chapters: Vec<Chapter>,

    /// Instant used for `dc:date` and `dcterms:modified`, defaults to the build time
    pub timestamp: Option<DateTime<Utc>>,
}

/// Package Builder
///
/// Collects the book description and produces a validated [`Package`].
#[derive(Debug, Default)]
pub struct PackageBuilder {
    options: EpubOptions,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder from already collected options
    pub fn from_options(options: EpubOptions) -> Self {
        Self { options }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.options.title = Some(title.to_string());
        self
    }

    /// Set the ISBN, written as `urn:isbn:<isbn>`
    pub fn set_isbn(&mut self, isbn: &str) -> &mut Self {
        self.options.isbn = Some(isbn.to_string());
        self
    }

    pub fn set_creator(&mut self, creator: &str) -> &mut Self {
        self.options.creator = Some(creator.to_string());
        self
    }

    /// Set the author name shown on the index page
    ///
    /// # Parameters
    /// - `firstname`: Author first name
    /// - `surname`: Author surname
    pub fn set_author(&mut self, firstname: &str, surname: &str) -> &mut Self {
        self.options.author_firstname = Some(firstname.to_string());
        self.options.author_surname = Some(surname.to_string());
        self
    }

    pub fn set_publisher(&mut self, publisher: &str) -> &mut Self {
        self.options.publisher = Some(publisher.to_string());
        self
    }

    pub fn set_copyright(&mut self, copyright: &str) -> &mut Self {
        self.options.copyright = Some(copyright.to_string());
        self
    }

    pub fn set_language(&mut self, language: &str) -> &mut Self {
        self.options.language = Some(language.to_string());
        self
    }

    /// Set the file name of the output archive
    pub fn set_out_file_name(&mut self, out_file_name: &str) -> &mut Self {
        self.options.out_file_name = Some(out_file_name.to_string());
        self
    }

    /// Set the cover image
    ///
    /// The file is looked up in the source directory at assembly time.
    pub fn set_cover(&mut self, file_name: &str) -> &mut Self {
        self.options.cover = Some(file_name.to_string());
        self
    }

    /// Add a gallery image
    ///
    /// Added images will be appended to the end of the existing list.
    pub fn add_image(&mut self, file_name: &str) -> &mut Self {
        self.options.images.push(file_name.to_string());
        self
    }

    /// Add a chapter
    ///
    /// Added chapters will be appended to the end of the existing list.
    pub fn add_chapter(&mut self, chapter: Chapter) -> &mut Self {
        self.options.chapters.push(chapter);
        self
    }

    /// Override the build instant
    ///
    /// Without an override the instant is captured when `build` runs.
    pub fn set_timestamp(&mut self, instant: DateTime<Utc>) -> &mut Self {
        self.options.timestamp = Some(instant);
        self
    }

    /// Build the package
    ///
    /// # Return
    /// - `Ok(Package)`: The normalized package
    /// - `Err(EpubError)`: The title is missing or empty, there are no chapters,
    ///   or two manifest items would share an id
    pub fn build(self) -> Result<Package, EpubError> {
        let options = self.options;

        let title = match options.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => {
                return Err(EpubBuilderError::MissingRequiredField {
                    field: "title".to_string(),
                }
                .into());
            }
        };

        if options.chapters.is_empty() {
            return Err(EpubBuilderError::MissingRequiredField {
                field: "chapters".to_string(),
            }
            .into());
        }

        let identifier = match &options.isbn {
            Some(isbn) => format!("urn:isbn:{}", isbn),
            None => fallback_identifier(&title, options.creator.as_deref()),
        };

        let timestamps = match options.timestamp {
            Some(instant) => Timestamps::from_datetime(instant),
            None => Timestamps::now(),
        };

        let package = Package {
            title,
            identifier,
            creator: options.creator,
            author_firstname: options.author_firstname,
            author_surname: options.author_surname,
            publisher: options.publisher,
            copyright: options.copyright,
            language: non_empty_or(options.language, DEFAULT_LANGUAGE),
            timestamps,
            out_file_name: non_empty_or(options.out_file_name, DEFAULT_OUT_FILE_NAME),
            cover: options.cover,
            images: options.images,
            chapters: options.chapters,
        };

        // Rejects manifest id collisions before any staging happens.
        manifest(&package)?;

        info!(
            "Built package '{}' with {} chapters and {} images.",
            package.title,
            package.chapters.len(),
            package.images.len() + usize::from(package.cover.is_some())
        );

        Ok(package)
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Stable identifier for packages without an ISBN
///
/// Derived from the title and the creator only, so rebuilding the same
/// book keeps its identity.
fn fallback_identifier(title: &str, creator: Option<&str>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(creator.unwrap_or_default().as_bytes());
    let hash = hasher.finalize();

    let hex: String = hash.iter().map(|byte| format!("{:02x}", byte)).collect();
    format!("urn:sha1:{}", hex)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{
        builder::{EpubOptions, PackageBuilder, fallback_identifier},
        error::{EpubBuilderError, EpubError},
        types::{Chapter, Section},
    };

    fn minimal_builder() -> PackageBuilder {
        let mut builder = PackageBuilder::new();
        builder
            .set_title("Example Title")
            .add_chapter(Chapter::new("Chapter 1", "<p>Chapter 1 content</p>"));
        builder
    }

    #[test]
    fn test_build_defaults() {
        let package = minimal_builder().build().unwrap();

        assert_eq!(package.title, "Example Title");
        assert_eq!(package.language, "en");
        assert_eq!(package.out_file_name, "book.epub");
        assert!(package.identifier.starts_with("urn:sha1:"));
        assert!(package.creator.is_none());
        assert!(package.publisher.is_none());
        assert!(package.copyright.is_none());
        assert!(package.cover.is_none());
        assert!(package.images.is_empty());
        assert!(package.chapters[0].sections.is_empty());
    }

    #[test]
    fn test_build_with_all_fields() {
        let instant = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();

        let mut builder = PackageBuilder::new();
        builder
            .set_title("Example Title")
            .set_isbn("9780000000000")
            .set_creator("John Doe")
            .set_author("John", "Doe")
            .set_publisher("Example Press")
            .set_copyright("CC-BY")
            .set_language("de")
            .set_out_file_name("out.epub")
            .set_cover("cover.jpg")
            .add_image("one.png")
            .add_image("two.jpeg")
            .set_timestamp(instant)
            .add_chapter(
                Chapter::new("Chapter 1", "<p>One</p>")
                    .with_section(Section::new("Section 1.1", "<p>1.1</p>")),
            )
            .add_chapter(Chapter::new("Chapter 2", "<p>Two</p>"));

        let package = builder.build().unwrap();

        assert_eq!(package.identifier, "urn:isbn:9780000000000");
        assert_eq!(package.creator.as_deref(), Some("John Doe"));
        assert_eq!(package.author_firstname.as_deref(), Some("John"));
        assert_eq!(package.author_surname.as_deref(), Some("Doe"));
        assert_eq!(package.language, "de");
        assert_eq!(package.out_file_name, "out.epub");
        assert_eq!(package.cover.as_deref(), Some("cover.jpg"));
        assert_eq!(package.images, vec!["one.png", "two.jpeg"]);
        assert_eq!(package.timestamps.modified, "2023-12-31T23:59:59Z");
        assert_eq!(package.timestamps.date, "2023-12-31");
        assert_eq!(package.chapters.len(), 2);
        assert_eq!(package.chapters[0].sections[0].title, "Section 1.1");
        assert_eq!(package.chapters[1].title, "Chapter 2");
    }

    #[test]
    fn test_build_missing_title() {
        let mut builder = PackageBuilder::new();
        builder.add_chapter(Chapter::new("Chapter 1", ""));

        assert_eq!(
            builder.build().unwrap_err(),
            EpubError::from(EpubBuilderError::MissingRequiredField {
                field: "title".to_string()
            })
        );

        let mut builder = PackageBuilder::new();
        builder
            .set_title("   ")
            .add_chapter(Chapter::new("Chapter 1", ""));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_build_missing_chapters() {
        let mut builder = PackageBuilder::new();
        builder.set_title("Example Title");

        assert_eq!(
            builder.build().unwrap_err(),
            EpubError::from(EpubBuilderError::MissingRequiredField {
                field: "chapters".to_string()
            })
        );
    }

    #[test]
    fn test_build_rejects_colliding_asset_ids() {
        let mut builder = minimal_builder();
        builder.add_image("a.jpg").add_image("a.png");

        assert_eq!(
            builder.build().unwrap_err(),
            EpubError::from(EpubBuilderError::DuplicateManifestId {
                manifest_id: "a".to_string()
            })
        );
    }

    #[test]
    fn test_build_rejects_asset_colliding_with_document() {
        let mut builder = minimal_builder();
        builder.add_image("htmltoc.png");

        assert!(builder.build().is_err());
    }

    #[test]
    fn test_empty_optional_values_fall_back_to_defaults() {
        let options = EpubOptions {
            title: Some("Example Title".to_string()),
            language: Some(String::new()),
            out_file_name: Some(" ".to_string()),
            chapters: vec![Chapter::new("Chapter 1", "")],
            ..Default::default()
        };

        let package = PackageBuilder::from_options(options).build().unwrap();
        assert_eq!(package.language, "en");
        assert_eq!(package.out_file_name, "book.epub");
    }

    #[test]
    fn test_fallback_identifier_is_stable() {
        let first = fallback_identifier("Example Title", Some("John Doe"));
        let second = fallback_identifier("Example Title", Some("John Doe"));
        let other = fallback_identifier("Example Title", None);

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.len(), "urn:sha1:".len() + 40);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_from_json() {
        let options: EpubOptions = serde_json::from_str(
            r#"{
                "title": "Example Title",
                "author_firstname": "John",
                "author_surname": "Doe",
                "images": ["one.png"],
                "timestamp": "2024-01-02T03:04:05Z",
                "chapters": [
                    { "title": "Chapter 1", "content": "<p>One</p>" },
                    {
                        "title": "Chapter 2",
                        "content": "<p>Two</p>",
                        "sections": [{ "title": "Section 2.1", "content": "<p>2.1</p>" }]
                    }
                ]
            }"#,
        )
        .unwrap();

        let package = PackageBuilder::from_options(options).build().unwrap();
        assert_eq!(package.author_surname.as_deref(), Some("Doe"));
        assert_eq!(package.timestamps.date, "2024-01-02");
        assert!(package.chapters[0].sections.is_empty());
        assert_eq!(package.chapters[1].sections[0].title, "Section 2.1");
    }
}
