//! Embedded static assets.
//!
//! The stylesheet and page script are compiled into the binary with
//! `include_str!`, so `folio serve` needs no asset directory.

use std::path::Path;

/// Stylesheet for the page.
pub const CSS: &str = include_str!("assets/site.css");

/// Page script. Forwards DOM events to the session API and applies the
/// returned view state.
pub const JS: &str = include_str!("assets/site.js");

/// URL path the stylesheet is served under.
pub const CSS_PATH: &str = "/assets/site.css";

/// URL path the page script is served under.
pub const JS_PATH: &str = "/assets/site.js";

/// Image types served from the media directory.
const MEDIA_TYPES: [(&str, &str); 7] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
];

/// Content type for a media file name, by extension.
#[must_use]
pub fn media_content_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

/// Whether `name` is a plain image file name (no directories, not hidden).
#[must_use]
pub fn is_media_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains(char::is_whitespace)
        && media_content_type(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(media_content_type("a.png"), Some("image/png"));
        assert_eq!(media_content_type("a.JPG"), Some("image/jpeg"));
        assert_eq!(media_content_type("a.svg"), Some("image/svg+xml"));
        assert_eq!(media_content_type("a.exe"), None);
        assert_eq!(media_content_type("png"), None);
    }

    #[test]
    fn media_names_reject_paths() {
        assert!(is_media_file_name("fillit.png"));
        assert!(!is_media_file_name("../secret.png"));
        assert!(!is_media_file_name("dir/a.png"));
        assert!(!is_media_file_name(".hidden.png"));
        assert!(!is_media_file_name("🚚"));
        assert!(!is_media_file_name("my image.png"));
    }

    #[test]
    fn script_uses_session_api() {
        assert!(JS.contains("/api/sessions"));
        assert!(CSS.contains(".mobile-menu"));
    }

    #[test]
    fn script_keeps_user_actions() {
        // Each throttled listener owns its pending flag.
        assert!(!JS.contains("var pending = false;\n  var body"));
        assert!(JS.contains("function throttled(build) {\n    var pending = false;"));
        // Stale replies are discarded.
        assert!(JS.contains("seq > appliedSeq"));
        // Messages wait for the session and fall back locally.
        assert!(JS.contains("ensureSession()"));
        assert!(JS.contains("applyLocally(message)"));
        // Images that failed before the script ran still get the glyph.
        assert!(JS.contains("img.complete && img.naturalWidth === 0"));
    }
}
