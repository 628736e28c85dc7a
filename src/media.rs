//! Media type resolution for image assets
//!
//! Media types are looked up by file extension in [`MEDIA_TYPES`].
//! An unresolved media type is reported as a warning and never aborts a build;
//! the manifest then carries an empty media type for that asset.

use log::warn;

/// Registered `(extension, media type)` pairs, matched case-insensitively
pub static MEDIA_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

/// Resolves the media type of `file_name` from its last extension
///
/// ## Return
/// - `Some(&str)`: The registered media type
/// - `None`: The file name has no extension, or the extension is not registered
pub fn resolve_media_type(file_name: &str) -> Option<&'static str> {
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        warn!(
            "Unable to resolve the media type of '{}': no file extension.",
            file_name
        );
        return None;
    };

    let mime = MEDIA_TYPES
        .iter()
        .find(|(registered, _)| registered.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime);

    if mime.is_none() {
        warn!(
            "Unable to resolve the media type of '{}': extension '{}' is not registered.",
            file_name, extension
        );
    }

    mime
}
