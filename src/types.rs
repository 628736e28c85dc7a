use chrono::{DateTime, SecondsFormat, Utc};

/// Represents a complete book, ready to be rendered and archived
///
/// The `Package` structure is the canonical document tree produced by
/// [`PackageBuilder`](crate::builder::PackageBuilder). It owns all of its chapters
/// and sections and is never modified once built, so every document rendered from
/// it shares the same metadata and the same timestamps.
#[derive(Debug, Clone)]
pub struct Package {
    /// The title of the publication
    pub title: String,

    /// The publication identifier
    ///
    /// `urn:isbn:<isbn>` when an ISBN was supplied, otherwise a stable
    /// `urn:sha1:` identifier derived from the title and the creator.
    pub identifier: String,

    /// Optional creator, written as `dc:creator`
    pub creator: Option<String>,

    /// Optional author first name, shown on the index page
    pub author_firstname: Option<String>,

    /// Optional author surname, shown on the index page
    pub author_surname: Option<String>,

    /// Optional publisher, written as `dc:publisher`
    pub publisher: Option<String>,

    /// Optional copyright statement, written as `dc:rights`
    pub copyright: Option<String>,

    /// Language code of the publication
    pub language: String,

    /// Timestamps captured once when the package was built
    pub timestamps: Timestamps,

    /// File name of the output archive
    pub out_file_name: String,

    /// Optional cover image file name, resolved against the source directory
    pub cover: Option<String>,

    /// Gallery image file names, resolved against the source directory
    pub images: Vec<String>,

    /// Chapters in reading order
    pub chapters: Vec<Chapter>,
}

/// Represents a chapter of the publication
///
/// Each chapter is rendered into its own content document. The chapter's
/// position in [`Package::chapters`] determines its file name and ids.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Chapter {
    /// The chapter title
    pub title: String,

    /// The chapter body
    ///
    /// A pre-rendered markup fragment. It is inserted into the chapter
    /// document verbatim and is not validated.
    #[cfg_attr(feature = "serde", serde(default))]
    pub content: String,

    /// Nested sections in reading order, possibly empty
    #[cfg_attr(feature = "serde", serde(default))]
    pub sections: Vec<Section>,
}

impl Chapter {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            sections: vec![],
        }
    }

    /// Appends a section to the end of the chapter
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }
}

/// Represents a section nested in a chapter
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Section {
    /// The section title
    pub title: String,

    /// The section body, inserted verbatim
    pub content: String,
}

impl Section {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
        }
    }
}

/// Build timestamps
///
/// Both values are derived from a single instant, so documents rendered at
/// different moments of one build embed the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamps {
    /// Full instant, formatted as `YYYY-MM-DDThh:mm:ssZ` for `dcterms:modified`
    pub modified: String,

    /// Date-only form, formatted as `YYYY-MM-DD` for `dc:date`
    pub date: String,
}

impl Timestamps {
    /// Captures the current instant
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self {
            modified: instant.to_rfc3339_opts(SecondsFormat::Secs, true),
            date: instant.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Represents a resource item declared in the package manifest
///
/// Manifest items are derived from the package, one per generated document
/// and one per image asset. They are never supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    /// The unique id of the item
    pub id: String,

    /// The path of the resource, relative to the package document
    pub href: String,

    /// The media type of the resource
    ///
    /// Empty when the media type of an image could not be resolved.
    pub mime: String,

    /// Optional properties, such as `nav` or `cover-image`
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn new(id: &str, href: &str, mime: &str) -> Self {
        Self {
            id: id.to_string(),
            href: href.to_string(),
            mime: mime.to_string(),
            properties: None,
        }
    }

    pub fn with_properties(mut self, properties: &str) -> Self {
        self.properties = Some(properties.to_string());
        self
    }

    /// Attributes of the `<item>` element, in output order
    pub(crate) fn attributes(&self) -> Vec<(&str, &str)> {
        let mut attributes = vec![("id", self.id.as_str()), ("href", self.href.as_str())];
        attributes.push(("media-type", self.mime.as_str()));

        if let Some(properties) = &self.properties {
            attributes.push(("properties", properties.as_str()));
        }

        attributes
    }
}

/// Represents an item in the spine, defining the reading order of the publication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    /// The id of the manifest item this spine item points to
    pub idref: String,

    /// Whether this item is part of the linear reading order
    ///
    /// `Some(false)` keeps the item out of the normal reading progression
    /// (the cover), `Some(true)` marks it linear explicitly, and `None` leaves
    /// the attribute out so the reading system default applies.
    pub linear: Option<bool>,
}

impl SpineItem {
    pub fn new(idref: &str) -> Self {
        Self {
            idref: idref.to_string(),
            linear: None,
        }
    }

    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = Some(linear);
        self
    }

    pub(crate) fn attributes(&self) -> Vec<(&str, &str)> {
        let mut attributes = vec![("idref", self.idref.as_str())];

        match self.linear {
            Some(true) => attributes.push(("linear", "yes")),
            Some(false) => attributes.push(("linear", "no")),
            None => {}
        }

        attributes
    }
}

/// Represents an entry in the table of contents
///
/// Top level entries are chapters, their children are the chapter's sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    /// The display label of this entry
    pub label: String,

    /// Link target, relative to the navigation document
    pub href: String,

    /// Child entries
    pub children: Vec<NavPoint>,
}
