//! # Text loader module
//!
//! Module dedicated to reading text files whose encoding is not
//! known in advance. Candidate charsets are tried in a fixed order
//! until one decodes the whole file. Text decoded with a legacy
//! single-byte charset is assumed to be stored in visual order and
//! goes through [bidi correction](bidi).

pub mod bidi;

use std::{fmt, fs, io, path::PathBuf};

use encoding_rs::{UTF_8, WINDOWS_1255};
use oem_cp::code_table::DECODING_TABLE_CP862;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors related to text loading.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find file at {0:?}")]
    FileNotFoundError(PathBuf),
    #[error("cannot read file at {1:?}")]
    ReadFileError(#[source] io::Error, PathBuf),
    #[error("cannot decode file at {0:?} using charsets {1:?}")]
    DecodeFileError(PathBuf, Vec<Charset>),
}

/// The `Result` alias of the module.
pub type Result<T> = std::result::Result<T, Error>;

/// The charsets the loader knows how to decode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Charset {
    Utf8,
    /// Hebrew DOS code page.
    Ibm862,
    /// Hebrew Windows code page.
    Windows1255,
}

impl Charset {
    /// The default candidate list, in trial order.
    pub const DEFAULT_CANDIDATES: [Charset; 3] =
        [Charset::Utf8, Charset::Ibm862, Charset::Windows1255];

    /// Decode the given bytes, returning `None` on the first
    /// malformed or unmappable sequence.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => {
                let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
                (!had_errors).then(|| text.into_owned())
            }
            Self::Ibm862 => Some(oem_cp::decode_string_complete_table(
                bytes,
                &DECODING_TABLE_CP862,
            )),
            Self::Windows1255 => WINDOWS_1255
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
        }
    }

    /// Return `true` for single-byte legacy charsets, whose Hebrew
    /// runs are stored in visual order.
    pub fn is_legacy(&self) -> bool {
        !matches!(self, Self::Utf8)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "UTF-8"),
            Self::Ibm862 => write!(f, "IBM-862"),
            Self::Windows1255 => write!(f, "Windows-1255"),
        }
    }
}

/// Text decoded from a file, not yet bidi-corrected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decoded {
    pub text: String,
    pub charset: Charset,
}

impl Decoded {
    /// Consume the decoded text, applying bidi correction when it was
    /// decoded from a legacy charset.
    pub fn into_logical(self) -> String {
        if self.charset.is_legacy() {
            bidi::correct(self.text)
        } else {
            self.text
        }
    }
}

/// Encoding-resilient text loader.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextLoader {
    charsets: Vec<Charset>,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            charsets: Charset::DEFAULT_CANDIDATES.to_vec(),
        }
    }
}

impl TextLoader {
    /// Create a new loader using the default candidate charsets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the candidate charsets following the builder pattern.
    pub fn with_charsets(mut self, charsets: impl IntoIterator<Item = Charset>) -> Self {
        self.charsets = charsets.into_iter().collect();
        self
    }

    /// Return the candidate charsets, in trial order.
    pub fn charsets(&self) -> &[Charset] {
        &self.charsets
    }

    /// Read then decode the file at the given path, without bidi
    /// correction.
    pub fn decode(&self, path: impl Into<PathBuf>) -> Result<Decoded> {
        let path = path.into();

        let bytes = fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::FileNotFoundError(path.clone()),
            _ => Error::ReadFileError(err, path.clone()),
        })?;

        self.decode_bytes(&bytes)
            .ok_or_else(|| Error::DecodeFileError(path.clone(), self.charsets.clone()))
            .map(|decoded| {
                debug!("decoded {path:?} using {}", decoded.charset);
                decoded
            })
    }

    /// Decode the given bytes using the first candidate charset that
    /// succeeds.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Option<Decoded> {
        self.charsets.iter().find_map(|charset| match charset.decode(bytes) {
            Some(text) => Some(Decoded {
                text,
                charset: *charset,
            }),
            None => {
                info!("{charset} decoding failed, trying next charset");
                None
            }
        })
    }

    /// Read then decode the file at the given path, applying bidi
    /// correction when a legacy charset was used.
    pub fn load(&self, path: impl Into<PathBuf>) -> Result<String> {
        Ok(self.decode(path)?.into_logical())
    }

    /// Same as [`TextLoader::load`], but for optional enrichments:
    /// failures are logged and turned into `None`.
    pub fn try_load(&self, path: impl Into<PathBuf>) -> Option<String> {
        match self.load(path) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!("{err}, skipping it");
                debug!("{err:?}");
                None
            }
        }
    }
}
