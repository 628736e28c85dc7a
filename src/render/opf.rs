//! Container and package document rendering
//!
//! The package document lists every file of the publication in its manifest
//! and fixes the reading order in its spine. Both lists are derived from the
//! [`Package`] by [`manifest`] and [`spine`], so the ids used here always match
//! the ids used by the content documents.

use indexmap::{IndexMap, map::Entry};
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::{
    error::{EpubBuilderError, EpubError},
    identifier::{
        CONTENT_DIR, COVER_FILE, COVER_ID, COVERS_DIR, IMAGES_DIR, INDEX_FILE, INDEX_ID,
        NAVIGATION_FILE, NAVIGATION_ID, PACKAGE_FILE, asset_id, chapter_file, chapter_id,
    },
    media::resolve_media_type,
    render::{XmlWriter, finish_writer, new_writer, write_declaration, write_element},
    types::{ManifestItem, Package, SpineItem},
};

const XHTML_MIME: &str = "application/xhtml+xml";
const PACKAGE_MIME: &str = "application/oebps-package+xml";
const PUB_IDENTIFIER: &str = "pub-identifier";

/// Creates the `container.xml` document
///
/// The content never depends on the package: it always points at `EPUB/package.opf`.
pub fn make_container() -> Result<String, EpubError> {
    let mut writer = new_writer();
    let full_path = format!("{}/{}", CONTENT_DIR, PACKAGE_FILE);

    write_declaration(&mut writer)?;
    writer.write_event(Event::Start(BytesStart::new("container").with_attributes([
        ("xmlns", "urn:oasis:names:tc:opendocument:xmlns:container"),
        ("version", "1.0"),
    ])))?;
    writer.write_event(Event::Start(BytesStart::new("rootfiles")))?;
    writer.write_event(Event::Empty(BytesStart::new("rootfile").with_attributes([
        ("full-path", full_path.as_str()),
        ("media-type", PACKAGE_MIME),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("rootfiles")))?;
    writer.write_event(Event::End(BytesEnd::new("container")))?;

    finish_writer(writer)
}

/// Creates the `package.opf` document
pub fn make_package_document(package: &Package) -> Result<String, EpubError> {
    let manifest = manifest(package)?;
    let mut writer = new_writer();

    write_declaration(&mut writer)?;
    writer.write_event(Event::Start(BytesStart::new("package").with_attributes([
        ("xmlns", "http://www.idpf.org/2007/opf"),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ("xmlns:dcterms", "http://purl.org/dc/terms/"),
        ("version", "3.0"),
        ("xml:lang", package.language.as_str()),
        ("unique-identifier", PUB_IDENTIFIER),
    ])))?;

    make_opf_metadata(&mut writer, package)?;
    make_opf_manifest(&mut writer, manifest.values())?;
    make_opf_spine(&mut writer, &spine(package))?;

    writer.write_event(Event::End(BytesEnd::new("package")))?;

    finish_writer(writer)
}

/// Derives the manifest of the package
///
/// Items appear in this order: navigation document, cover document, cover image
/// (only when a cover was supplied), index document, every chapter, every gallery
/// image. Hrefs are relative to the package document.
///
/// # Return
/// - `Ok(IndexMap)`: Manifest items keyed by id, in manifest order
/// - `Err(EpubError)`: Two items share an id
pub fn manifest(package: &Package) -> Result<IndexMap<String, ManifestItem>, EpubError> {
    let mut items = vec![
        ManifestItem::new(NAVIGATION_ID, NAVIGATION_FILE, XHTML_MIME).with_properties("nav"),
        ManifestItem::new(COVER_ID, COVER_FILE, XHTML_MIME),
    ];

    if let Some(cover) = &package.cover {
        items.push(asset_item(COVERS_DIR, cover).with_properties("cover-image"));
    }

    items.push(ManifestItem::new(INDEX_ID, INDEX_FILE, XHTML_MIME));

    for index in 0..package.chapters.len() {
        items.push(ManifestItem::new(
            &chapter_id(index),
            &chapter_file(index),
            XHTML_MIME,
        ));
    }

    for image in &package.images {
        items.push(asset_item(IMAGES_DIR, image));
    }

    let mut manifest = IndexMap::with_capacity(items.len());
    for item in items {
        match manifest.entry(item.id.clone()) {
            Entry::Occupied(_) => {
                return Err(EpubBuilderError::DuplicateManifestId {
                    manifest_id: item.id,
                }
                .into());
            }
            Entry::Vacant(entry) => {
                entry.insert(item);
            }
        }
    }

    Ok(manifest)
}

/// Derives the spine of the package
///
/// The cover is kept out of the linear reading order, the navigation document
/// is explicitly linear, and the chapters follow in order.
pub fn spine(package: &Package) -> Vec<SpineItem> {
    let mut spine = vec![
        SpineItem::new(COVER_ID).with_linear(false),
        SpineItem::new(INDEX_ID),
        SpineItem::new(NAVIGATION_ID).with_linear(true),
    ];
    spine.extend((0..package.chapters.len()).map(|index| SpineItem::new(&chapter_id(index))));

    spine
}

fn asset_item(dir: &str, file_name: &str) -> ManifestItem {
    let mime = resolve_media_type(file_name).unwrap_or_default();
    let href = format!("{}/{}", dir, file_name);

    ManifestItem::new(&asset_id(file_name), &href, mime)
}

fn make_opf_metadata(writer: &mut XmlWriter, package: &Package) -> Result<(), EpubError> {
    writer.write_event(Event::Start(BytesStart::new("metadata")))?;

    write_element(
        writer,
        "dc:identifier",
        &[("id", PUB_IDENTIFIER)],
        &package.identifier,
    )?;
    write_element(writer, "dc:title", &[("id", "pub-title")], &package.title)?;
    write_element(
        writer,
        "dc:language",
        &[("id", "pub-language")],
        &package.language,
    )?;
    write_element(writer, "dc:date", &[], &package.timestamps.date)?;
    write_element(
        writer,
        "meta",
        &[("property", "dcterms:modified")],
        &package.timestamps.modified,
    )?;

    if let Some(creator) = &package.creator {
        write_element(writer, "dc:creator", &[("id", "pub-creator")], creator)?;
    }
    if let Some(publisher) = &package.publisher {
        write_element(writer, "dc:publisher", &[], publisher)?;
    }
    if let Some(copyright) = &package.copyright {
        write_element(writer, "dc:rights", &[], copyright)?;
    }

    for (property, value) in [
        ("schema:accessMode", "textual"),
        ("schema:accessMode", "visual"),
        ("schema:accessModeSufficient", "textual,visual"),
        ("schema:accessModeSufficient", "textual"),
    ] {
        write_element(writer, "meta", &[("property", property)], value)?;
    }

    writer.write_event(Event::End(BytesEnd::new("metadata")))?;

    Ok(())
}

fn make_opf_manifest<'a>(
    writer: &mut XmlWriter,
    items: impl Iterator<Item = &'a ManifestItem>,
) -> Result<(), EpubError> {
    writer.write_event(Event::Start(BytesStart::new("manifest")))?;

    for item in items {
        writer.write_event(Event::Empty(
            BytesStart::new("item").with_attributes(item.attributes()),
        ))?;
    }

    writer.write_event(Event::End(BytesEnd::new("manifest")))?;

    Ok(())
}

fn make_opf_spine(writer: &mut XmlWriter, spine: &[SpineItem]) -> Result<(), EpubError> {
    writer.write_event(Event::Start(BytesStart::new("spine")))?;

    for item in spine {
        writer.write_event(Event::Empty(
            BytesStart::new("itemref").with_attributes(item.attributes()),
        ))?;
    }

    writer.write_event(Event::End(BytesEnd::new("spine")))?;

    Ok(())
}
