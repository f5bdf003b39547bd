//! # Parameter file parser module
//!
//! A parameter file contains one `key=value` pair per line. Lines
//! are split on the first `=` only, lines without `=` and unknown
//! keys are ignored. Assignments are applied in file order, so the
//! last occurrence of a repeated key wins.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::loader::{bidi, TextLoader};

use super::{sidecar, EmailConfig, Error, Result};

/// The keys recognized in a parameter file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    SmtpServer,
    Port,
    User,
    Password,
    From,
    To,
    Bcc,
    AttachmentPath,
    AttachmentName,
    Subject,
    Body,
    UseTls,
    UseHtml,
    Logo,
    Signature,
    Debug,
    ReplyTo,
    ReadReceipt,
    TeamName,
    HtmlTemplate,
    Deprecated,
}

impl Key {
    /// Parse a parameter key, including its aliases.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "smtp_server" => Some(Self::SmtpServer),
            "port" => Some(Self::Port),
            "user" => Some(Self::User),
            "password" => Some(Self::Password),
            "from_" | "from" => Some(Self::From),
            "to" => Some(Self::To),
            "bcc" => Some(Self::Bcc),
            "fileandpath" => Some(Self::AttachmentPath),
            "filename" => Some(Self::AttachmentName),
            "subject" => Some(Self::Subject),
            "body" => Some(Self::Body),
            "cert" => Some(Self::UseTls),
            "html" | "use_html" => Some(Self::UseHtml),
            "logo" | "logo_path" => Some(Self::Logo),
            "signaturefile" | "signature_file" | "signature" => Some(Self::Signature),
            "debug" => Some(Self::Debug),
            "reply_to" | "replyto" => Some(Self::ReplyTo),
            "read_receipt" | "readreceipt" => Some(Self::ReadReceipt),
            "teamname" | "team_name" => Some(Self::TeamName),
            "htmltemplate" | "html_template" => Some(Self::HtmlTemplate),
            "sendamail" | "sendemail" => Some(Self::Deprecated),
            _ => None,
        }
    }

    /// Return `true` if values of this key are human text that may
    /// need bidi correction.
    ///
    /// Hosts, credentials, ports, flags and technical paths never go
    /// through bidi correction.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Self::From
                | Self::To
                | Self::Bcc
                | Self::AttachmentName
                | Self::Subject
                | Self::Body
                | Self::Signature
                | Self::ReplyTo
                | Self::TeamName
                | Self::HtmlTemplate
        )
    }
}

/// Split the given parameter file content into trimmed key/value
/// pairs, in file order.
pub fn entries(content: &str) -> impl Iterator<Item = (&str, &str)> {
    content.lines().filter_map(|line| {
        let (key, val) = line.split_once('=')?;
        Some((key.trim(), val.trim()))
    })
}

/// Parse a boolean parameter value.
pub fn parse_bool(val: &str) -> bool {
    val.eq_ignore_ascii_case("true")
}

/// Parse a comma-separated list of addresses, dropping empty entries.
pub fn parse_list(val: &str, fix: impl Fn(&str) -> String) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(fix)
        .collect()
}

fn some(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

/// Apply a single assignment to the given configuration.
///
/// The `visual` flag tells if text values are stored in visual order
/// and need bidi correction.
pub fn apply(mut config: EmailConfig, key: Key, val: &str, visual: bool) -> Result<EmailConfig> {
    let fix = |val: &str| {
        if visual && key.is_text() {
            bidi::correct_line(val)
        } else {
            val.to_owned()
        }
    };

    match key {
        Key::SmtpServer => config.smtp_server = val.to_owned(),
        Key::Port => {
            config.port = val
                .parse()
                .map_err(|err| Error::ParsePortError(err, val.to_owned()))?
        }
        Key::User => config.user = val.to_owned(),
        Key::Password => config.password = val.to_owned(),
        Key::From => config.from = some(fix(val)),
        Key::To => config.to = parse_list(val, fix),
        Key::Bcc => config.bcc = parse_list(val, fix),
        Key::AttachmentPath => config.attachment_path = some(val.to_owned()),
        Key::AttachmentName => config.attachment_name = some(fix(val)),
        Key::Subject => config.subject = fix(val),
        Key::Body => config.body = fix(val),
        Key::UseTls => config.use_tls = parse_bool(val),
        Key::UseHtml => config.use_html = parse_bool(val),
        Key::Logo => config.logo_path = some(val.to_owned()),
        Key::Signature => config.signature_file = some(fix(val)),
        Key::Debug => config.debug = parse_bool(val),
        Key::ReplyTo => config.reply_to = some(fix(val)),
        Key::ReadReceipt => config.read_receipt = parse_bool(val),
        Key::TeamName => config.team_name = some(fix(val)),
        Key::HtmlTemplate => config.html_template = some(fix(val)),
        Key::Deprecated => (),
    };

    Ok(config)
}

/// Parse the given parameter file content into a configuration,
/// without looking at sidecar files.
pub fn parse_str(content: &str, visual: bool) -> Result<EmailConfig> {
    entries(content).try_fold(EmailConfig::default(), |config, (key, val)| {
        match Key::parse(key) {
            Some(Key::Deprecated) => {
                info!("ignoring deprecated parameter {key}");
                Ok(config)
            }
            Some(k) => apply(config, k, val, visual),
            None => {
                debug!("ignoring unknown parameter {key}");
                Ok(config)
            }
        }
    })
}

/// Parse the parameter file at the given path, then merge its
/// sidecar files.
///
/// The body comes from the `.md` sidecar (which also enables HTML),
/// then the `.txt` sidecar, then the inline `body` parameter. A
/// non-empty `.list` sidecar overrides the single attachment path.
pub fn parse(path: impl AsRef<Path>) -> Result<EmailConfig> {
    parse_with(path, &TextLoader::new())
}

/// Same as [`parse`], using a custom text loader.
pub fn parse_with(path: impl AsRef<Path>, loader: &TextLoader) -> Result<EmailConfig> {
    let path = path.as_ref();
    info!("loading email configuration from {path:?}");

    let decoded = loader
        .decode(path)
        .map_err(Error::LoadParamFileError)?;
    let mut config = parse_str(&decoded.text, decoded.charset.is_legacy())?;

    match sidecar::load_body(path, loader) {
        Some(sidecar::Body::Markdown(body)) => {
            config.body = body;
            config.use_html = true;
        }
        Some(sidecar::Body::Text(body)) => {
            config.body = body;
        }
        None => (),
    }

    match sidecar::load_attachments(path, loader) {
        Ok(paths) if !paths.is_empty() => config.attachment_paths = paths,
        Ok(_) => (),
        Err(err) => {
            warn!("cannot load attachment list, skipping it: {err}");
            debug!("{err:?}");
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use concat_with::concat_line;
    use tempfile::tempdir;

    use crate::loader;

    use super::{parse, parse_str, Error};

    #[test]
    fn key_values() {
        let content = concat_line!(
            "smtp_server=mail.x.com",
            "port = 587",
            "user=a@x.com",
            "password=p=q",
            "to=b@y.com, ,c@z.com,",
            "bcc=",
            "subject=Hi",
            "cert=TRUE",
            "read_receipt=yes",
            "not a pair",
            "unknown=value",
            "sendemail=1",
        );

        let config = parse_str(content, false).unwrap();

        assert_eq!(config.smtp_server, "mail.x.com");
        assert_eq!(config.port, 587);
        assert_eq!(config.user, "a@x.com");
        assert_eq!(config.password, "p=q");
        assert_eq!(config.to, vec!["b@y.com", "c@z.com"]);
        assert!(config.bcc.is_empty());
        assert_eq!(config.subject, "Hi");
        assert!(config.use_tls);
        assert!(!config.read_receipt);
        assert!(config.is_valid());
    }

    #[test]
    fn last_assignment_wins() {
        let content = concat_line!("subject=first", "to=a@x.com", "subject=second");
        let config = parse_str(content, false).unwrap();
        assert_eq!(config.subject, "second");
    }

    #[test]
    fn aliases() {
        let content = concat_line!(
            "from_=Alice <a@x.com>",
            "logo_path=logo.png",
            "signature_file=sig.html",
            "replyto=r@x.com",
            "team_name=Ops",
            "html_template=tpl.html",
            "filename=report.pdf",
            "fileandpath=/tmp/report.pdf",
        );

        let config = parse_str(content, false).unwrap();

        assert_eq!(config.from(), "Alice <a@x.com>");
        assert_eq!(config.logo_path.as_deref(), Some("logo.png"));
        assert_eq!(config.signature_file.as_deref(), Some("sig.html"));
        assert_eq!(config.reply_to.as_deref(), Some("r@x.com"));
        assert_eq!(config.team_name.as_deref(), Some("Ops"));
        assert_eq!(config.html_template.as_deref(), Some("tpl.html"));
        assert_eq!(config.attachment_name.as_deref(), Some("report.pdf"));
        assert_eq!(config.attachment_path.as_deref(), Some("/tmp/report.pdf"));
    }

    #[test]
    fn bidi_correction_only_for_text_fields() {
        let content = concat_line!("subject=חוד", "password=חוד", "to=ינד <d@x.com>");

        let config = parse_str(content, true).unwrap();
        assert_eq!(config.subject, "דוח");
        assert_eq!(config.password, "חוד");
        assert_eq!(config.to, vec![">moc.x@d< דני"]);

        let config = parse_str(content, false).unwrap();
        assert_eq!(config.subject, "חוד");
    }

    #[test]
    fn invalid_port() {
        let res = parse_str("port=abc", false);
        assert!(matches!(res, Err(Error::ParsePortError(_, val)) if val == "abc"));
    }

    #[test]
    fn out_of_range_port_is_left_to_validation() {
        let content = concat_line!(
            "smtp_server=mail.x.com",
            "port=-1",
            "user=a@x.com",
            "to=a@x.com",
        );

        let config = parse_str(content, false).unwrap();
        assert_eq!(config.port, -1);

        let err = config.validate().unwrap_err();
        assert!(matches!(
            &err,
            Error::ValidateConfigError(msg) if msg == "Port is invalid, Password is missing"
        ));

        let config = parse_str("port=70000", false).unwrap();
        assert_eq!(config.smtp_port(), None);
    }

    #[test]
    fn missing_param_file() {
        let dir = tempdir().unwrap();
        let res = parse(dir.path().join("missing.par"));

        assert!(matches!(
            res,
            Err(Error::LoadParamFileError(loader::Error::FileNotFoundError(_)))
        ));
    }

    #[test]
    fn markdown_sidecar_wins_and_enables_html() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mail.par");
        fs::write(&path, "to=a@x.com\nbody=inline\n").unwrap();
        fs::write(dir.path().join("mail.txt"), "from txt").unwrap();
        fs::write(dir.path().join("mail.md"), "# from md").unwrap();

        let config = parse(&path).unwrap();
        assert_eq!(config.body, "# from md");
        assert!(config.use_html);
    }

    #[test]
    fn text_sidecar_wins_over_inline_body() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mail.par");
        fs::write(&path, "to=a@x.com\nbody=inline\n").unwrap();
        fs::write(dir.path().join("mail.txt"), "from txt").unwrap();

        let config = parse(&path).unwrap();
        assert_eq!(config.body, "from txt");
        assert!(!config.use_html);
    }

    #[test]
    fn list_sidecar_overrides_single_attachment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mail.par");
        fs::write(&path, "fileandpath=single.pdf\n").unwrap();
        fs::write(
            dir.path().join("mail.list"),
            concat_line!("# comment", "", "a.pdf", "second = b.pdf"),
        )
        .unwrap();

        let config = parse(&path).unwrap();
        assert_eq!(config.attachment_paths, vec!["a.pdf", "b.pdf"]);
        assert_eq!(config.attachments().len(), 2);
    }
}
