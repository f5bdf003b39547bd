//! # Message assembler module
//!
//! Turns a configuration and its resolved body into an
//! [`AssembledMessage`]. Inline resources and attachments are read
//! from disk here; the ones that cannot be read are skipped with a
//! warning.

use std::{
    fs,
    path::Path,
};

use shellexpand_utils::shellexpand_path;
use tracing::{debug, info, warn};

use crate::{body::ResolvedBody, config::EmailConfig};

use super::{AssembledMessage, Credentials, Part};

/// Guess the MIME type of the given contents.
fn content_type(contents: &[u8]) -> String {
    tree_magic_mini::from_u8(contents).to_owned()
}

/// Read the given file, warning and returning `None` on failure.
fn read(path: &Path, kind: &str) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(contents) => Some(contents),
        Err(err) => {
            warn!("cannot read {kind} {path:?}, skipping it: {err}");
            debug!("{err:?}");
            None
        }
    }
}

/// Return the name an attachment is presented under.
fn filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// The message assembler.
pub struct MessageAssembler<'a> {
    config: &'a EmailConfig,
}

impl<'a> MessageAssembler<'a> {
    pub fn new(config: &'a EmailConfig) -> Self {
        Self { config }
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            host: self.config.smtp_server.clone(),
            port: self.config.smtp_port().unwrap_or_default(),
            login: self.config.user.clone(),
            password: self.config.password.clone(),
            encryption: self.config.encryption(),
        }
    }

    /// Assemble the message from the given body.
    pub fn assemble(&self, body: ResolvedBody) -> AssembledMessage {
        let mut parts = Vec::new();
        let mut skipped = Vec::new();

        parts.push(Part::Body {
            content_type: body.strategy.content_type(),
            content: body.content,
        });

        for resource in body.resources.into_vec() {
            let path = shellexpand_path(&resource.path);

            match read(&path, "inline resource") {
                Some(contents) => parts.push(Part::Inline {
                    cid: resource.cid,
                    content_type: content_type(&contents),
                    path,
                    contents,
                }),
                None => skipped.push(path),
            }
        }

        for path in self.config.attachments() {
            let path = shellexpand_path(path);

            match read(&path, "attachment") {
                Some(contents) => {
                    info!("attaching {path:?}");
                    parts.push(Part::Attachment {
                        filename: filename(&path),
                        content_type: content_type(&contents),
                        path,
                        contents,
                    })
                }
                None => skipped.push(path),
            }
        }

        AssembledMessage {
            from: self.config.from().to_owned(),
            to: self.config.to.clone(),
            bcc: self.config.bcc.clone(),
            reply_to: self.config.reply_to.clone(),
            subject: self.config.subject.clone(),
            read_receipt: self.config.read_receipt,
            parts,
            skipped,
            credentials: self.credentials(),
        }
    }
}
