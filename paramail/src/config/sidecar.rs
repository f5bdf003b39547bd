//! # Sidecar files module
//!
//! Sidecar files live next to the parameter file and share its file
//! stem: `<stem>.md` and `<stem>.txt` override the body, `<stem>.list`
//! lists attachments.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::loader::{self, TextLoader};

/// The Markdown body sidecar extension.
pub const MARKDOWN_EXT: &str = "md";

/// The text body sidecar extension.
pub const TEXT_EXT: &str = "txt";

/// The attachment list sidecar extension.
pub const LIST_EXT: &str = "list";

/// The extensions of the files removed after a successful send,
/// next to the parameter file itself.
pub const CLEANUP_EXTS: [&str; 3] = [TEXT_EXT, "html", LIST_EXT];

/// A body loaded from a sidecar file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Body {
    /// Markdown body, to be rendered as HTML.
    Markdown(String),
    /// Plain text or explicit HTML body, used verbatim.
    Text(String),
}

/// Build the path of a sidecar file by replacing the extension of the
/// parameter file.
pub fn sibling(path: impl AsRef<Path>, ext: &str) -> PathBuf {
    path.as_ref().with_extension(ext)
}

/// Return the sidecar path if it exists and is not the parameter file
/// itself.
fn existing_sibling(path: &Path, ext: &str) -> Option<PathBuf> {
    let sibling = sibling(path, ext);
    (sibling != path && sibling.is_file()).then_some(sibling)
}

fn try_load(path: &Path, ext: &str, loader: &TextLoader) -> Option<String> {
    let path = existing_sibling(path, ext)?;

    info!("loading email body from {path:?}");

    match loader.load(&path) {
        Ok(body) => Some(body),
        Err(err) => {
            warn!("cannot load email body from {path:?}, skipping it: {err}");
            debug!("{err:?}");
            None
        }
    }
}

/// Load the body overriding the inline one, if any.
///
/// Markdown takes priority over plain text.
pub fn load_body(path: impl AsRef<Path>, loader: &TextLoader) -> Option<Body> {
    let path = path.as_ref();

    if let Some(body) = try_load(path, MARKDOWN_EXT, loader) {
        return Some(Body::Markdown(body));
    }

    try_load(path, TEXT_EXT, loader).map(Body::Text)
}

/// Parse the content of an attachment list.
///
/// Each non-empty line not starting with `#` supplies one path,
/// either bare or in the `key=path` form.
pub fn parse_attachment_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once('=') {
            Some((_, path)) => path.trim().to_owned(),
            None => line.to_owned(),
        })
        .collect()
}

/// Load the attachment paths from the `.list` sidecar file.
///
/// Returns an empty list when the sidecar does not exist.
pub fn load_attachments(path: impl AsRef<Path>, loader: &TextLoader) -> loader::Result<Vec<String>> {
    let Some(path) = existing_sibling(path.as_ref(), LIST_EXT) else {
        return Ok(Vec::new());
    };

    info!("loading attachments from {path:?}");
    let content = loader.load(&path)?;
    Ok(parse_attachment_list(&content))
}

/// Remove the parameter file and its cleanable sidecar files.
///
/// Failures are logged then ignored.
pub fn remove_param_files(path: impl AsRef<Path>) {
    let path = path.as_ref();

    let paths = Some(path.to_owned())
        .into_iter()
        .chain(CLEANUP_EXTS.iter().map(|ext| sibling(path, ext)));

    for path in paths {
        if !path.exists() {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => info!("deleted {path:?}"),
            Err(err) => {
                warn!("cannot delete {path:?}: {err}");
                debug!("{err:?}");
            }
        }
    }
}
