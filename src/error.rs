//! Unified error type.

use std::fmt;

/// The error type returned by vireo's fallible operations.
///
/// Per-request outcomes (404, 400, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// the failures that matter operationally: configuration problems, file I/O,
/// and a document that no longer parses.
#[derive(Debug)]
pub enum Error {
    /// Filesystem or socket failure.
    Io(std::io::Error),
    /// The document is not parseable JSON.
    Json(serde_json::Error),
    /// An environment variable was set to an unusable value.
    Config(String),
    /// The document parsed, but its top level is not an object.
    Document(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Json(e) => write!(f, "json: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Document(msg) => write!(f, "document: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Config(_) | Self::Document(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
