//! # HTML helpers module
//!
//! Small string-level helpers to detect and patch HTML bodies. They
//! do not parse HTML: markers are looked up case-insensitively.

use once_cell::sync::Lazy;
use regex::Regex;

/// Regex matching the first opening `<body>` tag, attributes
/// included.
static BODY_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<body[^>]*>").unwrap());

/// The closing body tag, before which signatures and footers are
/// injected.
pub const BODY_CLOSE: &str = "</body>";

/// The opening tags of the synthesized HTML document.
pub const DOCUMENT_OPEN: &str = "<html><body style='font-family: Arial, sans-serif;'>";

/// The closing tags of the synthesized HTML document.
pub const DOCUMENT_CLOSE: &str = "</body></html>";

/// Return `true` if the given text is already a full HTML document.
pub fn is_full_html(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    text.contains("<html>") || text.contains("<!doctype")
}

/// Build the image tag referencing an inline logo.
pub fn logo_img(cid: &str) -> String {
    format!("<img src='cid:{cid}' style='max-width: 200px; display: block; margin-bottom: 20px;'/>")
}

/// Inject the given snippet right before the last occurrence of the
/// given marker, or at the end when the marker cannot be found.
///
/// The injection is skipped when the HTML already contains the guard,
/// which makes it idempotent as long as the guard is part of the
/// snippet.
pub fn inject_before(html: &str, marker: &str, snippet: &str, guard: &str) -> String {
    if !guard.is_empty() && html.contains(guard) {
        return html.to_owned();
    }

    let lowercase_html = html.to_ascii_lowercase();
    let lowercase_marker = marker.to_ascii_lowercase();

    match lowercase_html.rfind(&lowercase_marker) {
        Some(idx) => {
            let (head, tail) = html.split_at(idx);
            format!("{head}{snippet}{tail}")
        }
        None => format!("{html}{snippet}"),
    }
}

/// Inject the given snippet right after the opening body tag, or at
/// the beginning when there is no opening body tag.
pub fn inject_after_body_open(html: &str, snippet: &str) -> String {
    match BODY_OPEN.find(html) {
        Some(m) => {
            let (head, tail) = html.split_at(m.end());
            format!("{head}{snippet}{tail}")
        }
        None => format!("{snippet}{html}"),
    }
}
