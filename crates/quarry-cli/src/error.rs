//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction or indexing error
    #[error(transparent)]
    Miner(#[from] quarry_miner::MinerError),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] quarry_store::StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Some files of a batch could not be indexed
    #[error("{failed} of {total} file(s) could not be indexed")]
    PartialFailure {
        /// Files that failed
        failed: usize,
        /// Files in the batch
        total: usize,
    },
}
