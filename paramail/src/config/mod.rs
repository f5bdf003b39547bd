//! # Configuration module
//!
//! This module contains the [`EmailConfig`], the immutable value
//! describing the single email to compose and send. It is built once
//! per run by the [parser](parser) from a parameter file and its
//! [sidecar](sidecar) files.

pub mod parser;
pub mod sidecar;

use std::{fmt, num::ParseIntError, path::PathBuf};

use thiserror::Error;

use crate::loader;

pub use self::parser::parse;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse port {1:?}")]
    ParsePortError(#[source] ParseIntError, String),
    #[error("invalid email configuration: {0}")]
    ValidateConfigError(String),
    #[error("cannot load parameter file")]
    LoadParamFileError(#[source] loader::Error),
}

/// The `Result` alias of the module.
pub type Result<T> = std::result::Result<T, Error>;

/// The port used by implicit SSL/TLS submission.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// The encryption the transport should negotiate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Encryption {
    /// Implicit SSL/TLS from the first byte.
    Tls,
    /// Plain connection upgraded with STARTTLS.
    StartTls,
    #[default]
    None,
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tls => write!(f, "SSL/TLS"),
            Self::StartTls => write!(f, "StartTLS"),
            Self::None => write!(f, "None"),
        }
    }
}

/// The email configuration.
///
/// Only the transport credentials and the recipients are required,
/// see [`EmailConfig::is_valid`].
#[derive(Clone, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub struct EmailConfig {
    /// The SMTP server host name.
    pub smtp_server: String,

    /// The SMTP server port, as written in the parameter file.
    ///
    /// Out of range values are kept so validation can report them, see
    /// [`EmailConfig::smtp_port`].
    pub port: i64,

    /// The SMTP login.
    pub user: String,

    /// The SMTP password.
    pub password: String,

    /// The sender address. Falls back to [`EmailConfig::user`].
    pub from: Option<String>,

    pub reply_to: Option<String>,

    /// The main recipients, in file order.
    pub to: Vec<String>,

    /// The blind carbon copy recipients, in file order.
    pub bcc: Vec<String>,

    pub subject: String,

    /// The body, either inline or loaded from a sidecar file.
    pub body: String,

    /// Whether the transport should negotiate STARTTLS.
    pub use_tls: bool,

    /// Whether the body should be rendered as HTML.
    pub use_html: bool,

    /// Whether a read receipt should be requested.
    pub read_receipt: bool,

    /// Whether the parameter files should be kept after sending.
    pub debug: bool,

    pub logo_path: Option<String>,
    pub signature_file: Option<String>,
    pub html_template: Option<String>,
    pub team_name: Option<String>,

    /// The single attachment path.
    pub attachment_path: Option<String>,

    /// The display name of the single attachment.
    pub attachment_name: Option<String>,

    /// The attachment paths coming from the `.list` sidecar file.
    ///
    /// When not empty, they take precedence over
    /// [`EmailConfig::attachment_path`].
    pub attachment_paths: Vec<String>,
}

impl EmailConfig {
    /// Return the sender address, falling back to the SMTP login.
    pub fn from(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.user)
    }

    /// Return the attachment paths to send, in order.
    pub fn attachments(&self) -> Vec<PathBuf> {
        if !self.attachment_paths.is_empty() {
            self.attachment_paths.iter().map(PathBuf::from).collect()
        } else {
            self.attachment_path.iter().map(PathBuf::from).collect()
        }
    }

    /// Return the port to connect to, or `None` when it is out of the
    /// `1..=65535` range.
    pub fn smtp_port(&self) -> Option<u16> {
        u16::try_from(self.port).ok().filter(|port| *port > 0)
    }

    /// Return the encryption the transport should negotiate.
    ///
    /// STARTTLS wins when explicitly enabled, otherwise the implicit
    /// TLS port enables SSL/TLS.
    pub fn encryption(&self) -> Encryption {
        if self.use_tls {
            Encryption::StartTls
        } else if self.smtp_port() == Some(IMPLICIT_TLS_PORT) {
            Encryption::Tls
        } else {
            Encryption::None
        }
    }

    /// Return `true` if every required field is set.
    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Collect the human-readable reason of every missing required
    /// field.
    pub fn validation_errors(&self) -> Vec<&'static str> {
        let mut errors = Vec::new();

        if self.smtp_server.is_empty() {
            errors.push("SMTP server is missing");
        }
        if self.smtp_port().is_none() {
            errors.push("Port is invalid");
        }
        if self.user.is_empty() {
            errors.push("User is missing");
        }
        if self.password.is_empty() {
            errors.push("Password is missing");
        }
        if self.to.is_empty() {
            errors.push("Recipient email address is missing");
        }

        errors
    }

    /// Fail with every missing required field joined into a single
    /// message.
    pub fn validate(&self) -> Result<()> {
        let errors = self.validation_errors();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidateConfigError(errors.join(", ")))
        }
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("reply_to", &self.reply_to)
            .field("to", &self.to)
            .field("bcc", &self.bcc)
            .field("subject", &self.subject)
            .field("body", &self.body)
            .field("use_tls", &self.use_tls)
            .field("use_html", &self.use_html)
            .field("read_receipt", &self.read_receipt)
            .field("debug", &self.debug)
            .field("logo_path", &self.logo_path)
            .field("signature_file", &self.signature_file)
            .field("html_template", &self.html_template)
            .field("team_name", &self.team_name)
            .field("attachment_path", &self.attachment_path)
            .field("attachment_name", &self.attachment_name)
            .field("attachment_paths", &self.attachment_paths)
            .finish()
    }
}

impl fmt::Display for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EmailConfig[to={}, subject='{}', attachment='{}']",
            self.to.join(","),
            self.subject,
            self.attachment_name.as_deref().unwrap_or_default(),
        )
    }
}
