//! # Placeholder template module
//!
//! Module dedicated to the expansion of `{PLACEHOLDER}` tokens found
//! in HTML templates. Expansion is done in a single tokenizing pass:
//! substituted values are never scanned again, so a value containing
//! a placeholder token is inserted verbatim.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use shellexpand_utils::shellexpand_path;
use tracing::debug;

use crate::{config::EmailConfig, loader::TextLoader};

/// The date format used by `{DATE}`.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// The time format used by `{TIME}`.
pub const TIME_FORMAT: &str = "%H:%M";

/// The date time format used by `{DATETIME}`.
pub const DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// The domain part of generated content ids.
pub const CID_DOMAIN: &str = "paramail";

/// The placeholders known by the template engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Placeholder {
    UserMessage,
    TeamName,
    From,
    To,
    ReplyTo,
    Subject,
    UserEmail,
    SmtpServer,
    AttachmentName,
    Logo,
    Signature,
    Date,
    Time,
    DateTime,
}

impl Placeholder {
    /// Parse a placeholder name, without its surrounding braces.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "USER_MESSAGE" => Some(Self::UserMessage),
            "TEAM_NAME" => Some(Self::TeamName),
            "FROM" | "SENDER_EMAIL" => Some(Self::From),
            "TO" => Some(Self::To),
            "REPLY_TO" => Some(Self::ReplyTo),
            "SUBJECT" => Some(Self::Subject),
            "USER_EMAIL" => Some(Self::UserEmail),
            "SMTP_SERVER" => Some(Self::SmtpServer),
            "ATTACHMENT_NAME" => Some(Self::AttachmentName),
            "LOGO" => Some(Self::Logo),
            "SIGNATURE" => Some(Self::Signature),
            "DATE" => Some(Self::Date),
            "TIME" => Some(Self::Time),
            "DATETIME" => Some(Self::DateTime),
            _ => None,
        }
    }
}

/// A resource embedded in the message and referenced from the body
/// by its content id.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InlineResource {
    pub cid: String,
    pub path: PathBuf,
}

/// The inline resources registered during one composition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InlineResources {
    now: DateTime<Local>,
    resources: Vec<InlineResource>,
}

impl InlineResources {
    /// Create a new registry generating content ids from the given
    /// composition time.
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now,
            resources: Vec::new(),
        }
    }

    /// Register the resource at the given path and return its content
    /// id.
    ///
    /// Registering the same path twice returns the same content id.
    pub fn register(&mut self, name: &str, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();

        if let Some(resource) = self.resources.iter().find(|r| r.path == path) {
            return resource.cid.clone();
        }

        let cid = format!("{name}_{}@{CID_DOMAIN}", self.now.timestamp_millis());
        debug!("registering inline resource {path:?} as {cid}");

        self.resources.push(InlineResource {
            cid: cid.clone(),
            path: path.to_owned(),
        });

        cid
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InlineResource> {
        self.resources.iter()
    }

    pub fn into_vec(self) -> Vec<InlineResource> {
        self.resources
    }
}

/// Escape HTML special chars.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Escape HTML special chars then turn line breaks into `<br>` tags.
pub fn escape_html_with_breaks(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>")
}

/// Load the signature configured in the given configuration.
///
/// Returns `None` when the signature is not set or cannot be read.
pub fn load_signature(config: &EmailConfig, loader: &TextLoader) -> Option<String> {
    let path = config.signature_file.as_ref()?;
    let signature = loader.try_load(shellexpand_path(path))?;
    debug!("loaded signature from {path}");
    Some(signature)
}

/// The placeholder template engine.
///
/// Date and time placeholders are evaluated against the composition
/// time given at construction.
pub struct TemplateEngine<'a> {
    config: &'a EmailConfig,
    loader: &'a TextLoader,
    now: DateTime<Local>,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(config: &'a EmailConfig, loader: &'a TextLoader, now: DateTime<Local>) -> Self {
        Self {
            config,
            loader,
            now,
        }
    }

    /// Compute the substitution value of the given placeholder.
    ///
    /// `{LOGO}` registers the configured logo through the given
    /// callback, which must return its content id.
    fn value(&self, placeholder: Placeholder, register: &mut impl FnMut(&str) -> String) -> String {
        let config = self.config;

        match placeholder {
            Placeholder::UserMessage => escape_html_with_breaks(&config.body),
            Placeholder::TeamName => config.team_name.clone().unwrap_or_default(),
            Placeholder::From => config.from().to_owned(),
            Placeholder::To => config.to.join(", "),
            Placeholder::ReplyTo => config.reply_to.clone().unwrap_or_default(),
            Placeholder::Subject => config.subject.clone(),
            Placeholder::UserEmail => config.user.clone(),
            Placeholder::SmtpServer => config.smtp_server.clone(),
            Placeholder::AttachmentName => config.attachment_name.clone().unwrap_or_default(),
            Placeholder::Logo => match config.logo_path.as_deref() {
                Some(path) => format!("cid:{}", register(path)),
                None => String::new(),
            },
            Placeholder::Signature => load_signature(config, self.loader).unwrap_or_default(),
            Placeholder::Date => self.now.format(DATE_FORMAT).to_string(),
            Placeholder::Time => self.now.format(TIME_FORMAT).to_string(),
            Placeholder::DateTime => self.now.format(DATETIME_FORMAT).to_string(),
        }
    }

    /// Expand every known placeholder of the given template.
    ///
    /// Unknown placeholders are left verbatim.
    pub fn expand(&self, tpl: &str, mut register: impl FnMut(&str) -> String) -> String {
        let mut values: HashMap<Placeholder, String> = HashMap::new();
        let mut expanded = String::with_capacity(tpl.len());
        let mut rest = tpl;

        while let Some(start) = rest.find('{') {
            expanded.push_str(&rest[..start]);
            rest = &rest[start..];

            let placeholder = rest
                .find('}')
                .and_then(|end| Some((end, Placeholder::parse(&rest[1..end])?)));

            match placeholder {
                Some((end, placeholder)) => {
                    let value = values
                        .entry(placeholder)
                        .or_insert_with(|| self.value(placeholder, &mut register));
                    expanded.push_str(value);
                    rest = &rest[end + 1..];
                }
                None => {
                    expanded.push('{');
                    rest = &rest[1..];
                }
            }
        }

        expanded.push_str(rest);
        expanded
    }
}
