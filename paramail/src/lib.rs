#![doc = include_str!("../README.md")]

pub mod body;
pub mod compose;
pub mod config;
pub mod footer;
pub mod loader;
pub mod message;
pub mod template;

#[doc(inline)]
pub use self::{
    body::{BodyGenerator, ResolvedBody, Strategy},
    compose::{Composer, Outcome, Status},
    config::{EmailConfig, Encryption},
    footer::Footer,
    loader::{Charset, TextLoader},
    message::{AssembledMessage, MemoryTransport, MessageAssembler, Part, Transport},
    template::TemplateEngine,
};

/// The kind of an error, used by collaborators to classify the
/// outcome of a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    Decoding,
    Parse,
    Validation,
    Io,
    Transport,
}

/// The global `Error` enum of the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    LoaderError(#[from] loader::Error),

    #[error(transparent)]
    ConfigError(#[from] config::Error),

    #[error(transparent)]
    MessageError(#[from] message::Error),
}

impl loader::Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFoundError(_) => ErrorKind::NotFound,
            Self::ReadFileError(..) => ErrorKind::Io,
            Self::DecodeFileError(..) => ErrorKind::Decoding,
        }
    }
}

impl config::Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ParsePortError(..) => ErrorKind::Parse,
            Self::ValidateConfigError(_) => ErrorKind::Validation,
            Self::LoadParamFileError(err) => err.kind(),
        }
    }
}

impl message::Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WriteMessageError(_) => ErrorKind::Io,
            Self::SendMessageError(_) => ErrorKind::Transport,
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LoaderError(err) => err.kind(),
            Self::ConfigError(err) => err.kind(),
            Self::MessageError(err) => err.kind(),
        }
    }
}

/// The global `Result` alias of the library.
pub type Result<T> = std::result::Result<T, Error>;
