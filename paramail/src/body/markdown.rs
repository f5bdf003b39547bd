//! # Markdown module
//!
//! Conversion of the small Markdown-like dialect accepted in bodies:
//! `#`, `##` and `###` headings, `*` and `-` bullet lists,
//! `**bold**`, `*italic*`, `__underline__` and blank-line separated
//! paragraphs.
//!
//! Passes run in a fixed order, so later passes never match tags
//! produced by earlier ones.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::template::escape_html;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.+?)__").unwrap());

const HEADINGS: [(&str, &str); 3] = [("### ", "h3"), ("## ", "h2"), ("# ", "h1")];
const BULLETS: [&str; 2] = ["* ", "- "];

fn heading(line: &str) -> Option<String> {
    HEADINGS.iter().find_map(|(prefix, tag)| {
        let title = line.strip_prefix(prefix)?;
        Some(format!("<{tag}>{title}</{tag}>"))
    })
}

fn bullet(line: &str) -> Option<&str> {
    BULLETS.iter().find_map(|prefix| line.strip_prefix(prefix))
}

/// Convert headings and bullet lists, line by line.
///
/// Consecutive bullets are wrapped into a single list on one line.
fn convert_blocks(text: &str) -> String {
    let mut lines = Vec::new();
    let mut items: Vec<String> = Vec::new();

    for line in text.split('\n') {
        if let Some(item) = bullet(line) {
            items.push(format!("<li>{item}</li>"));
            continue;
        }

        if !items.is_empty() {
            lines.push(format!("<ul>{}</ul>", items.concat()));
            items.clear();
        }

        lines.push(heading(line).unwrap_or_else(|| line.to_owned()));
    }

    if !items.is_empty() {
        lines.push(format!("<ul>{}</ul>", items.concat()));
    }

    lines.join("\n")
}

/// Convert the given Markdown-like text to an HTML fragment.
pub fn to_html(markdown: &str) -> String {
    let html = escape_html(&markdown.replace("\r\n", "\n"));
    let html = convert_blocks(&html);
    let html = BOLD.replace_all(&html, "<strong>$1</strong>");
    let html = ITALIC.replace_all(&html, "<em>$1</em>");
    let html = UNDERLINE.replace_all(&html, "<u>$1</u>");
    let html = html.replace("\n\n", "</p><p>").replace('\n', "<br>");

    format!("<p>{html}</p>")
}

#[cfg(test)]
mod tests {
    use concat_with::concat_line;

    use super::to_html;

    #[test]
    fn headings() {
        assert_eq!(
            to_html(concat_line!("# One", "## Two", "### Three")),
            "<p><h1>One</h1><br><h2>Two</h2><br><h3>Three</h3></p>",
        );
    }

    #[test]
    fn lists() {
        assert_eq!(
            to_html(concat_line!("Items:", "* a", "- b", "", "after")),
            "<p>Items:<br><ul><li>a</li><li>b</li></ul></p><p>after</p>",
        );
    }

    #[test]
    fn inline_formatting() {
        assert_eq!(
            to_html("**bold** and *italic* and __under__"),
            "<p><strong>bold</strong> and <em>italic</em> and <u>under</u></p>",
        );
    }

    #[test]
    fn paragraphs_and_breaks() {
        assert_eq!(to_html("a\r\nb\r\n\r\nc"), "<p>a<br>b</p><p>c</p>");
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(to_html("1 < 2 & 3"), "<p>1 &lt; 2 &amp; 3</p>");
    }
}
