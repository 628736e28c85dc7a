//! Content document rendering
//!
//! Renders the navigation document, the cover, the index page and the chapters.
//! All of them are XHTML documents sharing the same prologue.

use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::{
    error::EpubError,
    identifier::{
        COVERS_DIR, chapter_file, chapter_heading_id, chapter_id, section_anchor,
        section_heading_id, section_href,
    },
    render::{XmlWriter, finish_writer, new_writer, write_declaration, write_element, write_raw},
    types::{Chapter, NavPoint, Package},
};

const COVER_STYLE: &str = "img { max-width: 100%; }";

/// Creates the navigation document
///
/// Every chapter gets a nested list of its sections, which stays empty
/// for chapters without sections.
pub fn make_navigation(package: &Package) -> Result<String, EpubError> {
    let mut writer = new_writer();

    make_prologue(&mut writer, package, &package.title, None)?;
    writer.write_event(Event::Start(BytesStart::new("body")))?;
    write_element(&mut writer, "h1", &[], &package.title)?;

    writer.write_event(Event::Start(BytesStart::new("nav").with_attributes([
        ("epub:type", "toc"),
        ("id", "toc"),
        ("role", "doc-toc"),
    ])))?;
    write_element(&mut writer, "h2", &[], "Table of Contents")?;
    make_nav(&mut writer, &nav_points(package), true)?;
    writer.write_event(Event::End(BytesEnd::new("nav")))?;

    make_epilogue(&mut writer)?;
    finish_writer(writer)
}

/// Creates the cover document
///
/// Shows the cover image in a figure, or the title when there is no cover.
pub fn make_cover(package: &Package) -> Result<String, EpubError> {
    let mut writer = new_writer();

    make_prologue(&mut writer, package, "Cover", Some(COVER_STYLE))?;
    writer.write_event(Event::Start(BytesStart::new("body")))?;

    match &package.cover {
        Some(cover) => {
            let src = format!("{}/{}", COVERS_DIR, cover);

            writer.write_event(Event::Start(BytesStart::new("figure")))?;
            writer.write_event(Event::Empty(BytesStart::new("img").with_attributes([
                ("src", src.as_str()),
                ("alt", package.title.as_str()),
            ])))?;
            writer.write_event(Event::End(BytesEnd::new("figure")))?;
        }
        None => write_raw(&mut writer, &package.title)?,
    }

    make_epilogue(&mut writer)?;
    finish_writer(writer)
}

/// Creates the index document with the title and the author
pub fn make_index(package: &Package) -> Result<String, EpubError> {
    let mut writer = new_writer();

    make_prologue(&mut writer, package, &package.title, None)?;
    writer.write_event(Event::Start(BytesStart::new("body")))?;
    writer.write_event(Event::Start(
        BytesStart::new("section").with_attributes([("class", "book"), ("id", "I_book_index")]),
    ))?;

    write_element(&mut writer, "h1", &[("class", "title")], &package.title)?;

    if package.author_firstname.is_some() || package.author_surname.is_some() {
        writer.write_event(Event::Start(
            BytesStart::new("div").with_attributes([("class", "author")]),
        ))?;
        write_element(
            &mut writer,
            "span",
            &[("class", "firstname")],
            package.author_firstname.as_deref().unwrap_or_default(),
        )?;
        write_raw(&mut writer, " ")?;
        write_element(
            &mut writer,
            "span",
            &[("class", "surname")],
            package.author_surname.as_deref().unwrap_or_default(),
        )?;
        writer.write_event(Event::End(BytesEnd::new("div")))?;
    }

    writer.write_event(Event::Empty(BytesStart::new("hr")))?;
    writer.write_event(Event::End(BytesEnd::new("section")))?;

    make_epilogue(&mut writer)?;
    finish_writer(writer)
}

/// Creates the document of the chapter at the 0-based `index`
///
/// The chapter section is labelled by its heading, and so is every nested section.
pub fn make_chapter(
    package: &Package,
    chapter: &Chapter,
    index: usize,
) -> Result<String, EpubError> {
    let mut writer = new_writer();
    let heading_id = chapter_heading_id(index);
    let section_id = chapter_id(index);

    make_prologue(&mut writer, package, &chapter.title, None)?;
    writer.write_event(Event::Start(BytesStart::new("body")))?;

    writer.write_event(Event::Start(BytesStart::new("section").with_attributes([
        ("class", "chapter"),
        ("epub:type", "chapter"),
        ("role", "doc-chapter"),
        ("aria-labelledby", heading_id.as_str()),
        ("id", section_id.as_str()),
    ])))?;
    write_element(
        &mut writer,
        "h1",
        &[("class", "chapter-title"), ("id", heading_id.as_str())],
        &chapter.title,
    )?;
    write_raw(&mut writer, &chapter.content)?;

    for (section_index, section) in chapter.sections.iter().enumerate() {
        let anchor = section_anchor(section_index);
        let heading_id = section_heading_id(section_index);

        writer.write_event(Event::Start(BytesStart::new("section").with_attributes([
            ("class", "section"),
            ("epub:type", "section"),
            ("role", "doc-section"),
            ("aria-labelledby", heading_id.as_str()),
            ("id", anchor.as_str()),
        ])))?;
        write_element(
            &mut writer,
            "h2",
            &[("class", "section-title"), ("id", heading_id.as_str())],
            &section.title,
        )?;
        write_raw(&mut writer, &section.content)?;
        writer.write_event(Event::End(BytesEnd::new("section")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("section")))?;

    make_epilogue(&mut writer)?;
    finish_writer(writer)
}

/// Table of contents entries: chapters with their sections as children
pub fn nav_points(package: &Package) -> Vec<NavPoint> {
    package
        .chapters
        .iter()
        .enumerate()
        .map(|(chapter_index, chapter)| NavPoint {
            label: chapter.title.clone(),
            href: chapter_file(chapter_index),
            children: chapter
                .sections
                .iter()
                .enumerate()
                .map(|(section_index, section)| NavPoint {
                    label: section.title.clone(),
                    href: section_href(chapter_index, section_index),
                    children: vec![],
                })
                .collect(),
        })
        .collect()
}

/// Writes the declaration, doctype, `<html>` and the whole `<head>`
fn make_prologue(
    writer: &mut XmlWriter,
    package: &Package,
    title: &str,
    style: Option<&str>,
) -> Result<(), EpubError> {
    write_declaration(writer)?;
    write_raw(writer, "\n<!DOCTYPE html>\n")?;

    writer.write_event(Event::Start(BytesStart::new("html").with_attributes([
        ("xmlns", "http://www.w3.org/1999/xhtml"),
        ("xmlns:epub", "http://www.idpf.org/2007/ops"),
        ("xml:lang", package.language.as_str()),
        ("lang", package.language.as_str()),
    ])))?;

    writer.write_event(Event::Start(BytesStart::new("head")))?;
    write_element(writer, "title", &[], title)?;
    if let Some(style) = style {
        write_element(writer, "style", &[("type", "text/css")], style)?;
    }
    writer.write_event(Event::End(BytesEnd::new("head")))?;

    Ok(())
}

/// Closes `<body>` and `<html>`
fn make_epilogue(writer: &mut XmlWriter) -> Result<(), EpubError> {
    writer.write_event(Event::End(BytesEnd::new("body")))?;
    writer.write_event(Event::End(BytesEnd::new("html")))?;

    Ok(())
}

/// Writes an ordered list of navigation points
///
/// On the top level every item gets a nested list, even an empty one.
fn make_nav(writer: &mut XmlWriter, points: &[NavPoint], top_level: bool) -> Result<(), EpubError> {
    writer.write_event(Event::Start(BytesStart::new("ol")))?;

    for point in points {
        writer.write_event(Event::Start(BytesStart::new("li")))?;
        write_element(writer, "a", &[("href", point.href.as_str())], &point.label)?;

        if top_level || !point.children.is_empty() {
            make_nav(writer, &point.children, false)?;
        }

        writer.write_event(Event::End(BytesEnd::new("li")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("ol")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{
        builder::PackageBuilder,
        render::xhtml::{make_chapter, make_cover, make_index, make_navigation, nav_points},
        types::{Chapter, Package, Section},
    };

    fn sample_package(configure: impl FnOnce(&mut PackageBuilder)) -> Package {
        let mut builder = PackageBuilder::new();
        builder
            .set_title("Example Title")
            .set_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .add_chapter(
                Chapter::new("Chapter 1", "<p>Chapter 1 content</p>")
                    .with_section(Section::new("Section 1.1", "<p>Section 1.1 content</p>"))
                    .with_section(Section::new("Section 1.2", "<p>Section 1.2 content</p>")),
            )
            .add_chapter(Chapter::new("Chapter 2", "<p>Chapter 2 content</p>"));
        configure(&mut builder);
        builder.build().unwrap()
    }

    #[test]
    fn test_make_navigation() {
        let package = sample_package(|_| {});
        let nav = make_navigation(&package).unwrap();

        assert!(nav.contains(r#"<nav epub:type="toc" id="toc" role="doc-toc">"#));
        assert!(nav.contains("<h2>Table of Contents</h2>"));
        assert!(nav.contains(concat!(
            r#"<li><a href="ch0001.xhtml">Chapter 1</a><ol>"#,
            r##"<li><a href="ch0001.xhtml#s0001">Section 1.1</a></li>"##,
            r##"<li><a href="ch0001.xhtml#s0002">Section 1.2</a></li>"##,
            "</ol></li>"
        )));
        assert!(nav.contains(r#"<li><a href="ch0002.xhtml">Chapter 2</a><ol></ol></li>"#));
    }

    #[test]
    fn test_nav_points_ignore_titles() {
        let mut builder = PackageBuilder::new();
        builder
            .set_title("Example Title")
            .add_chapter(
                Chapter::new("Prologue", "")
                    .with_section(Section::new("Zeta", ""))
                    .with_section(Section::new("Alpha", "")),
            )
            .add_chapter(Chapter::new("Appendix", "").with_section(Section::new("Omega", "")));
        let points = nav_points(&builder.build().unwrap());

        assert_eq!(points[0].href, "ch0001.xhtml");
        assert_eq!(points[0].children[0].href, "ch0001.xhtml#s0001");
        assert_eq!(points[0].children[1].href, "ch0001.xhtml#s0002");
        assert_eq!(points[1].href, "ch0002.xhtml");
        assert_eq!(points[1].children[0].href, "ch0002.xhtml#s0001");
    }

    #[test]
    fn test_make_cover_with_image() {
        let package = sample_package(|builder| {
            builder.set_cover("cover.jpg");
        });
        let cover = make_cover(&package).unwrap();

        assert!(cover.contains("<title>Cover</title>"));
        assert!(cover.contains(
            r#"<figure><img src="covers/cover.jpg" alt="Example Title"/></figure>"#
        ));
        assert!(!cover.contains("figcaption"));
    }

    #[test]
    fn test_make_cover_without_image() {
        let package = sample_package(|_| {});
        let cover = make_cover(&package).unwrap();

        assert!(cover.contains("<body>Example Title</body>"));
        assert!(!cover.contains("<img"));
    }

    #[test]
    fn test_make_index() {
        let package = sample_package(|builder| {
            builder.set_author("John", "Doe");
        });
        let index = make_index(&package).unwrap();

        assert!(index.contains(r#"<section class="book" id="I_book_index">"#));
        assert!(index.contains(r#"<h1 class="title">Example Title</h1>"#));
        assert!(index.contains(concat!(
            r#"<div class="author"><span class="firstname">John</span> "#,
            r#"<span class="surname">Doe</span></div>"#
        )));
        assert!(index.contains("<hr/>"));
        assert!(!index.contains("Chapter 1 content"));
    }

    #[test]
    fn test_make_index_without_author() {
        let package = sample_package(|_| {});
        let index = make_index(&package).unwrap();

        assert!(!index.contains(r#"class="author""#));
    }

    #[test]
    fn test_make_chapter_with_sections() {
        let package = sample_package(|_| {});
        let chapter = make_chapter(&package, &package.chapters[0], 0).unwrap();

        assert!(chapter.contains("<!DOCTYPE html>"));
        assert!(chapter.contains("<title>Chapter 1</title>"));
        assert!(chapter.contains(concat!(
            r#"<section class="chapter" epub:type="chapter" role="doc-chapter" "#,
            r#"aria-labelledby="c1_h" id="id-ch0001">"#,
            r#"<h1 class="chapter-title" id="c1_h">Chapter 1</h1>"#,
            "<p>Chapter 1 content</p>"
        )));
        assert!(chapter.contains(concat!(
            r#"<section class="section" epub:type="section" role="doc-section" "#,
            r#"aria-labelledby="s0002_h" id="s0002">"#,
            r#"<h2 class="section-title" id="s0002_h">Section 1.2</h2>"#,
            "<p>Section 1.2 content</p></section>"
        )));
        assert_eq!(chapter.matches(r#"class="section""#).count(), 2);
    }

    #[test]
    fn test_make_chapter_without_sections() {
        let package = sample_package(|_| {});
        let chapter = make_chapter(&package, &package.chapters[1], 1).unwrap();

        assert!(chapter.contains(r#"id="id-ch0002""#));
        assert!(chapter.contains(r#"<h1 class="chapter-title" id="c2_h">Chapter 2</h1>"#));
        assert_eq!(chapter.matches("<section").count(), 1);
    }

    #[test]
    fn test_user_text_is_not_escaped() {
        let mut builder = PackageBuilder::new();
        builder
            .set_title("Fish &amp; <em>Chips</em>")
            .add_chapter(Chapter::new("A <b>bold</b> start", "<p>x &lt; y</p>"));
        let package = builder.build().unwrap();

        let chapter = make_chapter(&package, &package.chapters[0], 0).unwrap();
        assert!(chapter.contains(r#"id="c1_h">A <b>bold</b> start</h1><p>x &lt; y</p>"#));

        let nav = make_navigation(&package).unwrap();
        assert!(nav.contains("<h1>Fish &amp; <em>Chips</em></h1>"));
    }
}
