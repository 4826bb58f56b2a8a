//! Error types for the conversion pipeline.

use std::fmt;
use std::io;

use thiserror::Error;

/// Everything that can end a conversion run.
#[derive(Error, Debug)]
pub enum Error {
    /// The input ZIP is unreadable or internally inconsistent.
    #[error("corrupt archive: {0}")]
    ArchiveCorrupt(String),

    /// A stored entry timestamp cannot be represented as an epoch time.
    #[error("invalid timestamp for `{name}`: {detail}")]
    TimestampInvalid { name: String, detail: String },

    /// An entry uses the name reserved for the checksum manifest.
    #[error("entry `{0}` collides with the checksum manifest file name")]
    NameCollision(String),

    #[error("I/O error: {0}")]
    Io(io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("conversion cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], suitable for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ArchiveCorrupt,
    TimestampInvalid,
    NameCollision,
    IoFailure,
    Config,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::ArchiveCorrupt => "archive corrupt",
            ErrorKind::TimestampInvalid => "timestamp invalid",
            ErrorKind::NameCollision => "name collision",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::Config => "configuration error",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

impl Error {
    pub fn corrupt(detail: impl Into<String>) -> Self {
        Error::ArchiveCorrupt(detail.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ArchiveCorrupt(_) => ErrorKind::ArchiveCorrupt,
            Error::TimestampInvalid { .. } => ErrorKind::TimestampInvalid,
            Error::NameCollision(_) => ErrorKind::NameCollision,
            Error::Io(_) | Error::Http(_) => ErrorKind::IoFailure,
            Error::Config(_) => ErrorKind::Config,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Prefix I/O errors with what was being done; other kinds already say.
    pub(crate) fn context(self, what: impl fmt::Display) -> Self {
        match self {
            Error::Io(err) => Error::Io(io::Error::new(err.kind(), format!("{what}: {err}"))),
            other => other,
        }
    }

    /// Wrap this error so it can travel through `std::io::Read`/`Write`.
    ///
    /// The original error is recovered by the `From<io::Error>` conversion.
    pub(crate) fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, self)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }

        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            _ => Error::Io(io::Error::from(kind)),
        }
    }
}
