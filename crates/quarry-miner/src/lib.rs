//! Quarry Miner
//!
//! The indexing service that dispatches files to extractors and persists the
//! metadata they produce.
//!
//! # Overview
//!
//! For each file the miner:
//! - derives a stable content identifier and guesses the MIME type
//! - creates an [`ExtractionContext`](quarry_extract::ExtractionContext)
//! - runs the matching extractor on a blocking thread under a timeout
//! - retracts stale sub-resources and stores the new resource graph
//! - records or clears an error report for the file
//!
//! Batches run concurrently up to `max_concurrent`, and dispatch can be
//! paused and resumed at any time.
//!
//! # Examples
//!
//! ```no_run
//! use quarry_extract::ExtractorRegistry;
//! use quarry_miner::{FileTask, Miner, MinerConfig};
//! use quarry_store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::new("quarry.db")?;
//!     let miner = Miner::new(ExtractorRegistry::with_builtins(), store, MinerConfig::default())?;
//!
//!     let results = miner.index(vec![FileTask::new("notes.txt")]).await;
//!     for entry in results {
//!         println!("{}: {:?}", entry.path.display(), entry.result);
//!     }
//!     println!("{}", miner.metrics().summary());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod identity;
mod metrics;
mod miner;
mod reports;
mod state;

pub use config::{MinerConfig, MAX_CONCURRENT_LIMIT};
pub use error::MinerError;
pub use identity::{file_content_id, guess_mimetype, DEFAULT_MIMETYPE, FILE_ID_SCHEME};
pub use metrics::MinerMetrics;
pub use miner::{FileTask, IndexResult, Miner, Outcome};
pub use reports::{ErrorReport, ErrorReports};
pub use state::{MinerState, MinerStatus};
