//! Error types for extraction

use thiserror::Error;

/// Errors raised while constructing an extraction context
///
/// Fatal to that construction attempt: no context exists afterwards, so no
/// extractor can be invoked with it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Missing or invalid file, or empty content identifier
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors an extractor reports for the file it was given
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Reading the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No extractor handles this MIME type
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The extractor could not make sense of the file
    #[error("Extraction failed: {0}")]
    Failed(String),
}
