//! Error types for miner operations

use quarry_extract::{ContextError, ExtractError};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while dispatching files to extractors
#[derive(Error, Debug)]
pub enum MinerError {
    /// The context for a file could not be created
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// The extractor reported a failure
    #[error("Metadata extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// No extractor handles the file's MIME type
    #[error("Unsupported type: {0}")]
    Unsupported(String),

    /// The extractor did not finish in time
    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error report could not be read or written
    #[error("Report error: {0}")]
    Report(String),
}
