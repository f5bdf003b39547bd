//! # Message module
//!
//! Module dedicated to the final message: its ordered parts, its
//! MIME serialization and the [transport](transport) it is handed to.
//!
//! Parts are always ordered the same way: the body part first, then
//! the inline parts, then the attachment parts.

pub mod assembler;
pub mod transport;

use std::{borrow::Cow, io, path::PathBuf};

use mail_builder::{headers::address::Address, mime::MimePart, MessageBuilder};
use thiserror::Error;

use crate::config::Encryption;

pub use self::{
    assembler::MessageAssembler,
    transport::{MemoryTransport, SentMessage, Transport},
};

/// Errors related to the final message.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot write MIME message")]
    WriteMessageError(#[source] io::Error),
    #[error("cannot send message")]
    SendMessageError(#[source] transport::Error),
}

/// The `Result` alias of the module.
pub type Result<T> = std::result::Result<T, Error>;

/// One part of the final message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Part {
    /// The text or HTML body.
    Body {
        content_type: &'static str,
        content: String,
    },
    /// A resource referenced from the body by its content id.
    Inline {
        cid: String,
        content_type: String,
        path: PathBuf,
        contents: Vec<u8>,
    },
    /// A downloadable attachment.
    Attachment {
        filename: String,
        content_type: String,
        path: PathBuf,
        contents: Vec<u8>,
    },
}

impl Part {
    /// Build the MIME part of this message part.
    pub fn to_mime_part(&self) -> MimePart<'_> {
        match self {
            Self::Body {
                content_type,
                content,
            } => MimePart::new(*content_type, content.as_str()),
            Self::Inline {
                cid,
                content_type,
                contents,
                ..
            } => MimePart::new(content_type.as_str(), contents.as_slice())
                .inline()
                .cid(cid.as_str()),
            Self::Attachment {
                filename,
                content_type,
                contents,
                ..
            } => MimePart::new(content_type.as_str(), contents.as_slice())
                .attachment(filename.as_str()),
        }
    }
}

/// The credentials and connection parameters handed to the
/// transport.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub login: String,
    pub password: String,
    pub encryption: Encryption,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("encryption", &self.encryption)
            .finish()
    }
}

/// The fully assembled message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssembledMessage {
    pub from: String,
    pub to: Vec<String>,

    /// Blind carbon copy recipients, only part of the envelope.
    pub bcc: Vec<String>,

    pub reply_to: Option<String>,
    pub subject: String,
    pub read_receipt: bool,

    /// The ordered parts of the message.
    pub parts: Vec<Part>,

    /// The inline resources and attachments that could not be read.
    pub skipped: Vec<PathBuf>,

    pub credentials: Credentials,
}

/// Parse an address written either `email` or `Name <email>`.
pub fn parse_address(addr: &str) -> Address<'_> {
    let addr = addr.trim();

    match addr.rsplit_once('<') {
        Some((name, email)) if email.ends_with('>') => {
            let name = name.trim().trim_matches('"').trim();
            let email = email.trim_end_matches('>').trim();
            let name = if name.is_empty() {
                None
            } else {
                Some(Cow::Borrowed(name))
            };
            Address::new_address(name, email)
        }
        _ => Address::new_address(None::<Cow<str>>, addr),
    }
}

impl AssembledMessage {
    pub fn body(&self) -> Option<&Part> {
        self.parts.iter().find(|part| matches!(part, Part::Body { .. }))
    }

    pub fn inline_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts
            .iter()
            .filter(|part| matches!(part, Part::Inline { .. }))
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Part> {
        self.parts
            .iter()
            .filter(|part| matches!(part, Part::Attachment { .. }))
    }

    /// Return every envelope recipient: main recipients first, then
    /// blind carbon copy ones.
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.to.iter().chain(self.bcc.iter()).map(String::as_str)
    }

    /// Build the MIME tree of the message.
    ///
    /// The body and the inline parts are wrapped into a
    /// `multipart/related` part, which is itself wrapped with the
    /// attachments into a `multipart/mixed` part. Wrappers are only
    /// added when needed.
    fn to_mime_tree(&self) -> Option<MimePart<'_>> {
        let mut related: Vec<MimePart> = self
            .parts
            .iter()
            .filter(|part| !matches!(part, Part::Attachment { .. }))
            .map(Part::to_mime_part)
            .collect();

        let content = match related.len() {
            0 => None,
            1 => related.pop(),
            _ => Some(MimePart::new("multipart/related", related)),
        };

        let attachments: Vec<MimePart> = self.attachments().map(Part::to_mime_part).collect();

        if attachments.is_empty() {
            content
        } else {
            let mixed = content.into_iter().chain(attachments).collect::<Vec<_>>();
            Some(MimePart::new("multipart/mixed", mixed))
        }
    }

    /// Build the MIME message.
    ///
    /// Blind carbon copy recipients are not written as a header.
    pub fn to_msg_builder(&self) -> MessageBuilder<'_> {
        let mut builder = MessageBuilder::new()
            .from(parse_address(&self.from))
            .to(Address::new_list(
                self.to.iter().map(|addr| parse_address(addr)).collect(),
            ))
            .subject(self.subject.as_str());

        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(parse_address(reply_to));
        }

        if self.read_receipt {
            builder = builder.header("Disposition-Notification-To", parse_address(&self.from));
        }

        match self.to_mime_tree() {
            Some(part) => builder.body(part),
            None => builder.text_body(""),
        }
    }

    /// Write the MIME message to a vector of bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.to_msg_builder()
            .write_to_vec()
            .map_err(Error::WriteMessageError)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use mail_builder::headers::address::Address;
    use mail_parser::MessageParser;

    use crate::config::Encryption;

    use super::{parse_address, AssembledMessage, Credentials, Part};

    fn message(parts: Vec<Part>) -> AssembledMessage {
        AssembledMessage {
            from: "Alice <a@x.com>".into(),
            to: vec!["b@y.com".into(), "Carol <c@z.com>".into()],
            bcc: vec!["hidden@z.com".into()],
            reply_to: Some("r@x.com".into()),
            subject: "Hi".into(),
            read_receipt: true,
            parts,
            skipped: vec![],
            credentials: Credentials {
                host: "mail.x.com".into(),
                port: 587,
                login: "a@x.com".into(),
                password: "p".into(),
                encryption: Encryption::StartTls,
            },
        }
    }

    fn body(content: &str) -> Part {
        Part::Body {
            content_type: "text/html",
            content: content.into(),
        }
    }

    #[test]
    fn addresses() {
        match parse_address("\"Alice\" <a@x.com>") {
            Address::Address(addr) => {
                assert_eq!(addr.name.as_deref(), Some("Alice"));
                assert_eq!(addr.email, "a@x.com");
            }
            addr => panic!("unexpected address {addr:?}"),
        }

        match parse_address(" b@y.com ") {
            Address::Address(addr) => {
                assert_eq!(addr.name, None);
                assert_eq!(addr.email, "b@y.com");
            }
            addr => panic!("unexpected address {addr:?}"),
        }
    }

    #[test]
    fn recipients() {
        let msg = message(vec![body("Hi")]);
        assert_eq!(
            msg.recipients().collect::<Vec<_>>(),
            vec!["b@y.com", "Carol <c@z.com>", "hidden@z.com"],
        );
    }

    #[test]
    fn single_body_part() {
        let msg = message(vec![body("<p>Hello</p>")]);
        let mime = String::from_utf8(msg.to_vec().unwrap()).unwrap();

        assert!(mime.contains("Subject: Hi"));
        assert!(mime.contains("Reply-To: <r@x.com>"));
        assert!(mime.contains("Disposition-Notification-To: \"Alice\" <a@x.com>"));
        assert!(!mime.contains("hidden@z.com"));
        assert!(!mime.contains("multipart/"));

        let parsed = MessageParser::new().parse(mime.as_bytes()).unwrap();
        assert_eq!(parsed.subject(), Some("Hi"));
        assert_eq!(parsed.body_html(0).unwrap().trim(), "<p>Hello</p>");
    }

    #[test]
    fn inline_and_attachment_parts() {
        let msg = message(vec![
            body("<img src='cid:logo_1@paramail'/>"),
            Part::Inline {
                cid: "logo_1@paramail".into(),
                content_type: "image/png".into(),
                path: PathBuf::from("/tmp/logo.png"),
                contents: vec![0x89, b'P', b'N', b'G'],
            },
            Part::Attachment {
                filename: "report.txt".into(),
                content_type: "text/plain".into(),
                path: PathBuf::from("/tmp/report.txt"),
                contents: b"report".to_vec(),
            },
        ]);

        let mime = String::from_utf8(msg.to_vec().unwrap()).unwrap();

        assert!(mime.contains("multipart/mixed"));
        assert!(mime.contains("multipart/related"));
        assert!(mime.contains("Content-ID: <logo_1@paramail>"));
        assert!(mime.contains("Content-Disposition: inline"));
        assert!(mime.contains("filename=\"report.txt\""));

        let related = mime.find("multipart/related").unwrap();
        let body = mime.find("cid:logo_1@paramail").unwrap();
        let logo = mime.find("Content-ID").unwrap();
        let attachment = mime.find("report.txt").unwrap();
        assert!(related < body && body < logo && logo < attachment);
    }
}
