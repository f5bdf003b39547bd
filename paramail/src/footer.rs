//! # Footer module
//!
//! Every message ends with a branding line, whatever the body
//! strategy. The footer is guarded by a substring check, so it is
//! never inserted twice.

use tracing::debug;

use crate::body::{html, ResolvedBody};

/// The default branding line.
pub const DEFAULT_FOOTER: &str = "Sent with Paramail";

/// The footer injector.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Footer {
    text: String,
}

impl Default for Footer {
    fn default() -> Self {
        Self::new(DEFAULT_FOOTER)
    }
}

impl Footer {
    pub fn new(text: impl ToString) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Build the styled block injected into HTML bodies.
    pub fn to_html(&self) -> String {
        format!(
            "<div style='margin-top: 30px; padding-top: 10px; border-top: 1px solid #dddddd; font-size: 11px; color: #888888;'>{}</div>",
            self.text,
        )
    }

    /// Append the footer to the given content.
    ///
    /// HTML content gets the styled block right before the closing
    /// body tag, plain text gets the bare line after a blank line.
    pub fn apply(&self, content: &str, is_html: bool) -> String {
        if content.contains(&self.text) {
            debug!("footer already present, skipping it");
            return content.to_owned();
        }

        if is_html {
            html::inject_before(content, html::BODY_CLOSE, &self.to_html(), &self.text)
        } else {
            format!("{content}\n\n{}", self.text)
        }
    }

    /// Append the footer to the given resolved body.
    ///
    /// The body is only marked once this injector actually changed its
    /// content, so a body already embedding the footer stays unmarked.
    pub fn inject(&self, body: &mut ResolvedBody) {
        let content = self.apply(&body.content, body.strategy.is_html());
        body.footer_inserted |= content != body.content;
        body.content = content;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use crate::{
        body::{ResolvedBody, Strategy},
        template::InlineResources,
    };

    use super::Footer;

    #[test]
    fn plain_text() {
        assert_eq!(Footer::new("Brand").apply("Hello", false), "Hello\n\nBrand");
    }

    #[test]
    fn html_before_closing_body() {
        let footer = Footer::new("Brand");
        let html = footer.apply("<html><body>Hi</body></html>", true);

        assert!(html.starts_with("<html><body>Hi<div style="));
        assert!(html.ends_with(">Brand</div></body></html>"));
    }

    #[test]
    fn html_without_closing_body() {
        let html = Footer::new("Brand").apply("<p>Hi</p>", true);
        assert!(html.starts_with("<p>Hi</p><div"));
        assert!(html.ends_with("Brand</div>"));
    }

    #[test]
    fn idempotent() {
        let footer = Footer::default();

        for (content, is_html) in [("Hello", false), ("<body>Hi</body>", true)] {
            let once = footer.apply(content, is_html);
            let twice = footer.apply(&once, is_html);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn template_already_embedding_footer() {
        let content = "<body><small>Sent with Paramail</small></body>";
        assert_eq!(Footer::default().apply(content, true), content);
    }

    #[test]
    fn inject_marks_body() {
        let mut body = ResolvedBody {
            strategy: Strategy::PlainText,
            content: "Hello".into(),
            resources: InlineResources::new(Local::now()),
            footer_inserted: false,
            fallbacks: vec![],
        };

        let footer = Footer::default();
        footer.inject(&mut body);
        footer.inject(&mut body);

        assert!(body.footer_inserted);
        assert_eq!(body.content, "Hello\n\nSent with Paramail");
    }

    #[test]
    fn inject_leaves_embedded_footer_unmarked() {
        let content = "<html><body><small>Sent with Paramail</small></body></html>";
        let mut body = ResolvedBody {
            strategy: Strategy::Template,
            content: content.into(),
            resources: InlineResources::new(Local::now()),
            footer_inserted: false,
            fallbacks: vec![],
        };

        Footer::default().inject(&mut body);

        assert!(!body.footer_inserted);
        assert_eq!(body.content, content);
    }
}
