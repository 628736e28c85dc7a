//! Document Renderer
//!
//! Every file of the package other than the copied images is generated here.
//! [`Document`] names one generated file; [`Document::render`] dispatches to
//! the render function of its kind and returns the document text.
//!
//! Rendering is pure: the same [`Package`] always renders to the same bytes.
//! User supplied text (titles, author names, body fragments) is written
//! verbatim and never escaped, so body fragments must already be valid markup.
//!
//! ## Usage
//!
//! ```rust, no_run
//! # fn main() -> Result<(), epub_assembler::error::EpubError> {
//! use epub_assembler::{builder::PackageBuilder, render::Document, types::Chapter};
//!
//! let mut builder = PackageBuilder::new();
//! builder
//!     .set_title("Example Title")
//!     .add_chapter(Chapter::new("Chapter 1", "<p>Chapter 1 content</p>"));
//! let package = builder.build()?;
//!
//! let chapter = Document::Chapter(0);
//! assert_eq!(chapter.path(), "EPUB/ch0001.xhtml");
//! let _xhtml = chapter.render(&package)?;
//! # Ok(())
//! # }
//! ```

pub mod opf;
pub mod xhtml;

use std::io::{Cursor, Write};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, Event},
};

use crate::{
    error::{EpubBuilderError, EpubError},
    identifier::{
        CONTAINER_PATH, CONTENT_DIR, COVER_FILE, INDEX_FILE, NAVIGATION_FILE, PACKAGE_FILE,
        chapter_file,
    },
    types::Package,
};

pub(crate) type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// A generated document of the package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    /// `META-INF/container.xml`, identical for every package
    Container,

    /// The navigation document holding the table of contents
    Navigation,

    /// The package document holding metadata, manifest and spine
    PackageDocument,

    Cover,

    /// Front matter with the title and the author
    Index,

    /// The chapter at the given 0-based index
    Chapter(usize),
}

impl Document {
    /// Path of the document inside the archive
    pub fn path(&self) -> String {
        match self {
            Document::Container => CONTAINER_PATH.to_string(),
            Document::Navigation => format!("{}/{}", CONTENT_DIR, NAVIGATION_FILE),
            Document::PackageDocument => format!("{}/{}", CONTENT_DIR, PACKAGE_FILE),
            Document::Cover => format!("{}/{}", CONTENT_DIR, COVER_FILE),
            Document::Index => format!("{}/{}", CONTENT_DIR, INDEX_FILE),
            Document::Chapter(index) => format!("{}/{}", CONTENT_DIR, chapter_file(*index)),
        }
    }

    /// Render the document
    ///
    /// # Return
    /// - `Ok(String)`: The document text
    /// - `Err(EpubError)`: XML writing failed, or a chapter index is out of range
    pub fn render(&self, package: &Package) -> Result<String, EpubError> {
        match self {
            Document::Container => opf::make_container(),
            Document::Navigation => xhtml::make_navigation(package),
            Document::PackageDocument => opf::make_package_document(package),
            Document::Cover => xhtml::make_cover(package),
            Document::Index => xhtml::make_index(package),
            Document::Chapter(index) => {
                let chapter = package
                    .chapters
                    .get(*index)
                    .ok_or(EpubBuilderError::ChapterNotFound { index: *index })?;
                xhtml::make_chapter(package, chapter, *index)
            }
        }
    }

    /// Documents under the content directory, in staging order
    ///
    /// Navigation, package document, cover and index come first,
    /// followed by every chapter in reading order.
    pub fn content_documents(package: &Package) -> Vec<Document> {
        let mut documents = vec![
            Document::Navigation,
            Document::PackageDocument,
            Document::Cover,
            Document::Index,
        ];
        documents.extend((0..package.chapters.len()).map(Document::Chapter));

        documents
    }
}

pub(crate) fn new_writer() -> XmlWriter {
    Writer::new(Cursor::new(Vec::new()))
}

pub(crate) fn finish_writer(writer: XmlWriter) -> Result<String, EpubError> {
    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

pub(crate) fn write_declaration(writer: &mut XmlWriter) -> Result<(), EpubError> {
    writer.write_event(Event::Decl(BytesDecl::new(
        "1.0",
        Some("UTF-8"),
        Some("no"),
    )))?;
    Ok(())
}

/// Writes `markup` into the document unchanged
pub(crate) fn write_raw(writer: &mut XmlWriter, markup: &str) -> Result<(), EpubError> {
    writer.get_mut().write_all(markup.as_bytes())?;
    Ok(())
}

/// Writes `<name attributes>markup</name>`, with `markup` left unescaped
pub(crate) fn write_element(
    writer: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
    markup: &str,
) -> Result<(), EpubError> {
    writer.write_event(Event::Start(
        BytesStart::new(name).with_attributes(attributes.iter().copied()),
    ))?;
    write_raw(writer, markup)?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        builder::PackageBuilder,
        error::{EpubBuilderError, EpubError},
        render::{Document, new_writer, write_element},
        types::Chapter,
    };

    #[test]
    fn test_document_paths() {
        assert_eq!(Document::Container.path(), "META-INF/container.xml");
        assert_eq!(Document::Navigation.path(), "EPUB/toc.xhtml");
        assert_eq!(Document::PackageDocument.path(), "EPUB/package.opf");
        assert_eq!(Document::Cover.path(), "EPUB/cover.xhtml");
        assert_eq!(Document::Index.path(), "EPUB/index.xhtml");
        assert_eq!(Document::Chapter(2).path(), "EPUB/ch0003.xhtml");
    }

    #[test]
    fn test_content_documents_order() {
        let mut builder = PackageBuilder::new();
        builder
            .set_title("Example Title")
            .add_chapter(Chapter::new("Chapter 1", ""))
            .add_chapter(Chapter::new("Chapter 2", ""));
        let package = builder.build().unwrap();

        assert_eq!(
            Document::content_documents(&package),
            vec![
                Document::Navigation,
                Document::PackageDocument,
                Document::Cover,
                Document::Index,
                Document::Chapter(0),
                Document::Chapter(1),
            ]
        );
    }

    #[test]
    fn test_render_chapter_out_of_range() {
        let mut builder = PackageBuilder::new();
        builder
            .set_title("Example Title")
            .add_chapter(Chapter::new("Chapter 1", ""));
        let package = builder.build().unwrap();

        assert_eq!(
            Document::Chapter(1).render(&package).unwrap_err(),
            EpubError::from(EpubBuilderError::ChapterNotFound { index: 1 })
        );
    }

    #[test]
    fn test_write_element_keeps_markup() {
        let mut writer = new_writer();
        write_element(&mut writer, "h1", &[("id", "c1_h")], "Fish &amp; <em>Chips</em>").unwrap();

        let text = String::from_utf8(writer.into_inner().into_inner()).unwrap();
        assert_eq!(text, r#"<h1 id="c1_h">Fish &amp; <em>Chips</em></h1>"#);
    }
}
