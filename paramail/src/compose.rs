//! # Compose module
//!
//! Module dedicated to the whole pipeline: parse the parameter file,
//! validate the configuration, generate the body, inject the footer,
//! assemble the message and hand it to the transport exactly once.
//!
//! The [`Composer::run`] entry point never fails: it reports an
//! [`Outcome`] that logging or notification collaborators can
//! consume.

use std::path::Path;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::{
    body::BodyGenerator,
    config::{self, sidecar, EmailConfig},
    footer::Footer,
    loader::TextLoader,
    message::{self, AssembledMessage, MessageAssembler, Transport},
    Error, Result,
};

/// The status of one run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Status {
    Success,
    Failure,
}

/// The outcome of one run, supplied to logging and notification
/// collaborators.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub struct Outcome {
    pub status: Status,
    pub message: String,

    /// The resolved configuration, when the parameter file could be
    /// parsed.
    pub config: Option<EmailConfig>,
}

impl Outcome {
    pub fn success(config: EmailConfig) -> Self {
        Self {
            status: Status::Success,
            message: String::from("Email sent successfully"),
            config: Some(config),
        }
    }

    pub fn failure(err: &Error, config: Option<EmailConfig>) -> Self {
        let message = match err {
            Error::ConfigError(config::Error::ValidateConfigError(errors)) => {
                format!("Invalid email configuration: {errors}")
            }
            err => format!("Email sending failed: {err}"),
        };

        Self {
            status: Status::Failure,
            message,
            config,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// The email composer.
#[derive(Clone, Debug, Default)]
pub struct Composer {
    loader: TextLoader,
    footer: Footer,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loader(mut self, loader: TextLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_footer(mut self, footer: Footer) -> Self {
        self.footer = footer;
        self
    }

    /// Parse the given parameter file, with its sidecar files.
    pub fn parse(&self, path: impl AsRef<Path>) -> Result<EmailConfig> {
        Ok(config::parser::parse_with(path, &self.loader)?)
    }

    /// Compose the message of the given configuration, evaluating date
    /// and time placeholders against the given instant.
    pub fn compose_at(&self, config: &EmailConfig, now: DateTime<Local>) -> Result<AssembledMessage> {
        config.validate()?;

        let mut body = BodyGenerator::new(config, &self.loader, now).generate();
        self.footer.inject(&mut body);

        let msg = MessageAssembler::new(config).assemble(body);

        for path in &msg.skipped {
            debug!("message assembled without {path:?}");
        }

        Ok(msg)
    }

    /// Compose the message of the given configuration.
    pub fn compose(&self, config: &EmailConfig) -> Result<AssembledMessage> {
        self.compose_at(config, Local::now())
    }

    /// Compose the message of the given configuration then send it.
    pub async fn send(&self, config: &EmailConfig, transport: &dyn Transport) -> Result<AssembledMessage> {
        let msg = self.compose(config)?;

        info!("sending email to {}", config.to.join(","));

        transport
            .send_message(&msg)
            .await
            .map_err(message::Error::SendMessageError)?;

        Ok(msg)
    }

    /// Run the whole pipeline on the given parameter file.
    ///
    /// After a successful send, the parameter file and its sidecar
    /// files are removed unless the configuration enables debug mode.
    pub async fn run(&self, path: impl AsRef<Path>, transport: &dyn Transport) -> Outcome {
        let path = path.as_ref();

        let config = match self.parse(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("cannot parse parameter file {path:?}: {err}");
                debug!("{err:?}");
                return Outcome::failure(&err, None);
            }
        };

        if let Err(err) = self.send(&config, transport).await {
            warn!("cannot send email {config}: {err}");
            debug!("{err:?}");
            return Outcome::failure(&err, Some(config));
        }

        if config.debug {
            info!("debug mode enabled, keeping all files");
        } else {
            sidecar::remove_param_files(path);
        }

        Outcome::success(config)
    }
}
