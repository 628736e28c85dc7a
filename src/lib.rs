//! Epub assembler
//!
//! A Rust library for assembling EPUB 3 eBook files from a title, optional
//! metadata, a cover, gallery images and chapters of pre-rendered XHTML.
//!
//! The library builds an in-memory document tree from the input, renders the
//! package document, the navigation document, a cover page, an index page and
//! one content document per chapter, stages them next to the copied images and
//! writes a container whose `mimetype` entry comes first and uncompressed.
//!
//! ## Features
//!
//! - Strict input validation before anything touches the filesystem.
//! - Deterministic identifiers and byte-identical documents for identical input.
//! - Exclusive staging area, removed on success, failure and cancellation alike.
//! - Optional timeout and cooperative cancellation between build steps.
//!
//! ## Quick Start
//!
//! ```rust, no_run
//! # fn main() -> Result<(), epub_assembler::error::EpubError> {
//! use epub_assembler::{assemble, builder::PackageBuilder, types::Chapter};
//!
//! let mut builder = PackageBuilder::new();
//! builder
//!     .set_title("Example Title")
//!     .set_isbn("9780000000000")
//!     .set_cover("cover.jpg")
//!     .add_image("map.png")
//!     .add_chapter(Chapter::new("Chapter 1", "<p>Chapter 1 content</p>"));
//!
//! // Images are resolved against "assets", the archive lands in the current directory
//! let path = assemble(&builder.build()?, "assets")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `serde`: Derive `serde::Deserialize` for [`builder::EpubOptions`] and the
//!   chapter types, so a whole book can be loaded from a configuration file.

pub mod archive;
pub mod assembler;
pub mod builder;
pub mod error;
pub mod identifier;
pub mod media;
pub mod render;
pub mod staging;
pub mod types;
pub(crate) mod utils;

pub use assembler::{Assembler, AssemblerConfig, assemble};
pub use builder::PackageBuilder;
pub use media::resolve_media_type;
pub use utils::CancelFlag;
