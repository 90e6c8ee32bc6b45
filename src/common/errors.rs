//! Error types for the decoding pipeline.

use thiserror::Error;

/// Errors surfaced by byte sources, the EBML reader and the WebM decoder.
///
/// All of these are fatal to the affected stream: the decoder worker logs
/// the error and the pull interface degrades to silence.
#[derive(Error, Debug)]
pub enum Error {
    /// A read past the end of the underlying byte source.
    #[error("access out of bounds: position {pos}, requested {requested}, length {length}")]
    OutOfRange {
        /// Offset the read started at.
        pos: u64,
        /// Number of bytes requested.
        requested: u64,
        /// Total length of the source.
        length: u64,
    },

    /// Structurally invalid EBML data.
    #[error("malformed ebml: {0}")]
    Malformed(String),

    /// A keyed search ran out of elements before finding the requested id.
    #[error("could not find element: {0}")]
    MissingElement(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Protocol-level HTTP failure (unexpected status, missing headers).
    #[error("http error: {0}")]
    Http(String),

    #[error("opus error: {0}")]
    Opus(String),
}

pub type Result<T> = std::result::Result<T, Error>;
