//! Identifier Scheme
//!
//! File names, element ids and manifest ids shared by every generated document.
//! Chapter and section numbers are 1-based and zero-padded to four digits,
//! so the first chapter is `ch0001` whatever its title is.

/// Name of the uncompressed identification entry
pub const MIMETYPE_FILE: &str = "mimetype";

/// Exact content of the `mimetype` entry
pub const MIMETYPE_CONTENT: &str = "application/epub+zip";

pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Directory holding the package document and every content document
pub const CONTENT_DIR: &str = "EPUB";

pub const PACKAGE_FILE: &str = "package.opf";
pub const NAVIGATION_FILE: &str = "toc.xhtml";
pub const COVER_FILE: &str = "cover.xhtml";
pub const INDEX_FILE: &str = "index.xhtml";

/// Directory of the cover image, relative to [`CONTENT_DIR`]
pub const COVERS_DIR: &str = "covers";

/// Directory of the gallery images, relative to [`CONTENT_DIR`]
pub const IMAGES_DIR: &str = "images";

pub const NAVIGATION_ID: &str = "htmltoc";
pub const COVER_ID: &str = "id-cover";
pub const INDEX_ID: &str = "id-index";

const PAD_WIDTH: usize = 4;

fn pad_number(number: usize) -> String {
    format!("{:0width$}", number, width = PAD_WIDTH)
}

/// File stem of the chapter at the 0-based `index`, e.g. `ch0001`
pub fn chapter_stem(index: usize) -> String {
    format!("ch{}", pad_number(index + 1))
}

/// File name of the chapter document, e.g. `ch0001.xhtml`
pub fn chapter_file(index: usize) -> String {
    format!("{}.xhtml", chapter_stem(index))
}

/// Manifest id of the chapter document, also used as the id of its `<section>`
pub fn chapter_id(index: usize) -> String {
    format!("id-{}", chapter_stem(index))
}

/// Id of the chapter heading, e.g. `c1_h`
pub fn chapter_heading_id(index: usize) -> String {
    format!("c{}_h", index + 1)
}

/// Anchor of the section at the 0-based `index` within its chapter, e.g. `s0001`
pub fn section_anchor(index: usize) -> String {
    format!("s{}", pad_number(index + 1))
}

pub fn section_heading_id(index: usize) -> String {
    format!("{}_h", section_anchor(index))
}

/// Navigation link to a section, e.g. `ch0002.xhtml#s0001`
pub fn section_href(chapter_index: usize, section_index: usize) -> String {
    format!(
        "{}#{}",
        chapter_file(chapter_index),
        section_anchor(section_index)
    )
}

/// Manifest id of an image asset
///
/// The final extension is stripped; names without a `.` are returned unchanged.
/// `a.jpg` and `a.png` therefore share the id `a`, which the package builder refuses.
pub fn asset_id(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => file_name.to_string(),
    }
}
