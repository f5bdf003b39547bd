//! # Body module
//!
//! Module dedicated to the generation of the message body. Three
//! mutually exclusive strategies exist, selected in this order:
//!
//! 1. [`Strategy::Template`] when an HTML template is configured and
//!    can be loaded,
//! 2. [`Strategy::DefaultHtml`] when HTML is requested, or a logo or a
//!    signature is configured,
//! 3. [`Strategy::PlainText`] otherwise.

pub mod html;
pub mod markdown;

use std::{fmt, path::PathBuf};

use chrono::{DateTime, Local};
use shellexpand_utils::shellexpand_path;
use tracing::{debug, info, warn};

use crate::{
    config::EmailConfig,
    loader::TextLoader,
    template::{load_signature, InlineResources, TemplateEngine},
};

/// The name used to build the logo content id.
pub const LOGO_CID_NAME: &str = "logo";

/// The body strategy actually used.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Strategy {
    Template,
    DefaultHtml,
    PlainText,
}

impl Strategy {
    pub fn is_html(&self) -> bool {
        !matches!(self, Self::PlainText)
    }

    /// The MIME type of the body part.
    pub fn content_type(&self) -> &'static str {
        if self.is_html() {
            "text/html"
        } else {
            "text/plain"
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::DefaultHtml => write!(f, "default-html"),
            Self::PlainText => write!(f, "plain-text"),
        }
    }
}

/// An event recorded when an optional enrichment could not be used.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Fallback {
    /// The configured HTML template could not be loaded.
    TemplateUnavailable(PathBuf),
}

/// The body resolved for one composition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedBody {
    pub strategy: Strategy,
    pub content: String,
    pub resources: InlineResources,

    /// Whether the footer injector inserted the footer. A body that
    /// already embeds the footer is left unmarked.
    pub footer_inserted: bool,
    pub fallbacks: Vec<Fallback>,
}

/// The body content generator.
pub struct BodyGenerator<'a> {
    config: &'a EmailConfig,
    loader: &'a TextLoader,
    now: DateTime<Local>,
}

impl<'a> BodyGenerator<'a> {
    pub fn new(config: &'a EmailConfig, loader: &'a TextLoader, now: DateTime<Local>) -> Self {
        Self {
            config,
            loader,
            now,
        }
    }

    fn wants_html(&self) -> bool {
        self.config.use_html
            || self.config.logo_path.is_some()
            || self.config.signature_file.is_some()
    }

    /// Expand the configured template, if any and if loadable.
    fn try_template(
        &self,
        resources: &mut InlineResources,
        fallbacks: &mut Vec<Fallback>,
    ) -> Option<String> {
        let path = shellexpand_path(self.config.html_template.as_ref()?);

        let tpl = match self.loader.load(&path) {
            Ok(tpl) => tpl,
            Err(err) => {
                warn!("cannot load html template, falling back to default body: {err}");
                debug!("{err:?}");
                fallbacks.push(Fallback::TemplateUnavailable(path));
                return None;
            }
        };

        info!("using html template {path:?}");

        let engine = TemplateEngine::new(self.config, self.loader, self.now);
        let html = engine.expand(&tpl, |logo| resources.register(LOGO_CID_NAME, logo));

        Some(html)
    }

    /// Build the default HTML body, from either an HTML document or
    /// Markdown-like text.
    fn default_html(&self, resources: &mut InlineResources) -> String {
        let body = &self.config.body;
        let logo = self
            .config
            .logo_path
            .as_ref()
            .map(|path| html::logo_img(&resources.register(LOGO_CID_NAME, path)));
        let signature = load_signature(self.config, self.loader).unwrap_or_default();

        if html::is_full_html(body) {
            let mut content = body.clone();

            if let Some(logo) = logo {
                content = html::inject_after_body_open(&content, &logo);
            }

            if !signature.is_empty() {
                content = html::inject_before(&content, html::BODY_CLOSE, &signature, "");
            }

            content
        } else {
            format!(
                "{}{}{}{}{}",
                html::DOCUMENT_OPEN,
                logo.unwrap_or_default(),
                markdown::to_html(body),
                signature,
                html::DOCUMENT_CLOSE,
            )
        }
    }

    /// Generate the body, selecting the first applicable strategy.
    pub fn generate(&self) -> ResolvedBody {
        let mut resources = InlineResources::new(self.now);
        let mut fallbacks = Vec::new();

        let (strategy, content) = match self.try_template(&mut resources, &mut fallbacks) {
            Some(content) => (Strategy::Template, content),
            None if self.wants_html() => (Strategy::DefaultHtml, self.default_html(&mut resources)),
            None => (Strategy::PlainText, self.config.body.clone()),
        };

        debug!("generated body using {strategy} strategy");

        ResolvedBody {
            strategy,
            content,
            resources,
            footer_inserted: false,
            fallbacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{DateTime, Local, TimeZone};
    use tempfile::tempdir;

    use crate::{config::EmailConfig, loader::TextLoader};

    use super::{BodyGenerator, Fallback, ResolvedBody, Strategy};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap()
    }

    fn generate(config: &EmailConfig) -> ResolvedBody {
        BodyGenerator::new(config, &TextLoader::new(), now()).generate()
    }

    fn config(body: &str) -> EmailConfig {
        EmailConfig {
            to: vec!["b@y.com".into()],
            body: body.into(),
            ..Default::default()
        }
    }

    #[test]
    fn plain_text() {
        let body = generate(&config("Hello *world*"));

        assert_eq!(body.strategy, Strategy::PlainText);
        assert_eq!(body.content, "Hello *world*");
        assert!(body.resources.is_empty());
        assert!(body.fallbacks.is_empty());
    }

    #[test]
    fn default_html_from_markdown() {
        let config = EmailConfig {
            use_html: true,
            ..config("# Hi\n**there**")
        };

        let body = generate(&config);

        assert_eq!(body.strategy, Strategy::DefaultHtml);
        assert_eq!(
            body.content,
            "<html><body style='font-family: Arial, sans-serif;'><p><h1>Hi</h1><br><strong>there</strong></p></body></html>",
        );
    }

    #[test]
    fn default_html_with_logo() {
        let config = EmailConfig {
            logo_path: Some("/tmp/logo.png".into()),
            ..config("Hello")
        };

        let body = generate(&config);
        let cid = format!("logo_{}@paramail", now().timestamp_millis());

        assert_eq!(body.strategy, Strategy::DefaultHtml);
        assert!(body.content.contains(&format!(
            "<body style='font-family: Arial, sans-serif;'><img src='cid:{cid}'"
        )));
        assert!(body.content.contains("/><p>Hello</p>"));
        assert_eq!(body.resources.iter().next().unwrap().cid, cid);
    }

    #[test]
    fn full_html_with_logo_and_signature() {
        let dir = tempdir().unwrap();
        let sig_path = dir.path().join("sig.html");
        fs::write(&sig_path, "<p>Alice</p>").unwrap();

        let config = EmailConfig {
            logo_path: Some("/tmp/logo.png".into()),
            signature_file: Some(sig_path.to_string_lossy().into()),
            ..config("<html><body><h1>Hi</h1></body></html>")
        };

        let body = generate(&config);
        let cid = format!("logo_{}@paramail", now().timestamp_millis());

        assert_eq!(body.strategy, Strategy::DefaultHtml);
        assert_eq!(
            body.content,
            format!(
                "<html><body><img src='cid:{cid}' style='max-width: 200px; display: block; margin-bottom: 20px;'/><h1>Hi</h1><p>Alice</p></body></html>"
            ),
        );
    }

    #[test]
    fn signature_is_appended_even_when_body_mentions_it() {
        let dir = tempdir().unwrap();
        let sig_path = dir.path().join("sig.html");
        fs::write(&sig_path, "Alice").unwrap();

        let config = EmailConfig {
            signature_file: Some(sig_path.to_string_lossy().into()),
            ..config("<html><body>Regards, Alice</body></html>")
        };

        let body = generate(&config);

        assert_eq!(body.strategy, Strategy::DefaultHtml);
        assert_eq!(body.content, "<html><body>Regards, AliceAlice</body></html>");
    }

    #[test]
    fn unreadable_signature_still_selects_html() {
        let config = EmailConfig {
            signature_file: Some("/nonexistent/sig.html".into()),
            ..config("Hello")
        };

        let body = generate(&config);

        assert_eq!(body.strategy, Strategy::DefaultHtml);
        assert!(body.content.ends_with("<p>Hello</p></body></html>"));
    }

    #[test]
    fn template() {
        let dir = tempdir().unwrap();
        let tpl_path = dir.path().join("tpl.html");
        fs::write(
            &tpl_path,
            "<html><body><img src=\"{LOGO}\"><p>{USER_MESSAGE}</p><p>{TO}</p></body></html>",
        )
        .unwrap();

        let config = EmailConfig {
            to: vec!["a@x.com".into(), "b@y.com".into()],
            logo_path: Some("/tmp/logo.png".into()),
            html_template: Some(tpl_path.to_string_lossy().into()),
            ..config("a < b\nc")
        };

        let body = generate(&config);
        let cid = format!("logo_{}@paramail", now().timestamp_millis());

        assert_eq!(body.strategy, Strategy::Template);
        assert_eq!(
            body.content,
            format!("<html><body><img src=\"cid:{cid}\"><p>a &lt; b<br>c</p><p>a@x.com, b@y.com</p></body></html>"),
        );
        assert_eq!(body.resources.iter().count(), 1);
    }

    #[test]
    fn missing_template_falls_back() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.html");

        let with_template = EmailConfig {
            use_html: true,
            html_template: Some(missing.to_string_lossy().into()),
            ..config("Hello")
        };
        let without_template = EmailConfig {
            html_template: None,
            ..with_template.clone()
        };

        let body = generate(&with_template);
        let expected = generate(&without_template);

        assert_eq!(body.strategy, Strategy::DefaultHtml);
        assert_eq!(body.content, expected.content);
        assert_eq!(body.fallbacks, vec![Fallback::TemplateUnavailable(missing)]);
        assert!(expected.fallbacks.is_empty());

        let plain = generate(&EmailConfig {
            use_html: false,
            ..with_template
        });
        assert_eq!(plain.strategy, Strategy::PlainText);
        assert_eq!(plain.fallbacks.len(), 1);
    }
}
