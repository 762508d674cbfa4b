//! Unified error type.

use thiserror::Error;

use crate::action::MappedParameters;
use crate::request::Request;

/// The error type returned by restmux's fallible operations.
///
/// An unmatched request is not an error: it is
/// [`MatchResult::Unmatched`](crate::MatchResult::Unmatched) and the caller
/// decides the status. This type surfaces registration mistakes, table
/// desynchronisation and infrastructure failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("unknown http method `{0}`")]
    UnknownMethod(String),

    #[error("invalid route `{path}`: {source}")]
    InvalidRoute {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    /// A [`MappedParameters`] named an action id with no handler behind it.
    /// Carries the request back to the caller untouched.
    #[error("action mismatch: request: {} {} parameters: {parameters}", .request.method(), .request.uri())]
    ActionMismatch {
        request: Box<Request>,
        parameters: MappedParameters,
    },

    #[error("chunked body already ended")]
    ChunkedBodyEnded,

    #[error("invalid media type `{0}`")]
    InvalidMediaType(String),

    #[error("body is not valid utf-8: {0}")]
    InvalidBody(#[from] std::str::Utf8Error),

    #[error("mapping: {0}")]
    Mapping(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
}
