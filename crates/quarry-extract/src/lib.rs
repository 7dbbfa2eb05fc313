//! Quarry Extract
//!
//! The handoff contract between the indexing service (the miner) and the
//! type-specific extractors that turn a file into a metadata resource graph.
//!
//! # Overview
//!
//! For every file it dispatches, the miner creates an [`ExtractionContext`]
//! carrying the file identity, its content identifier, MIME type, destination
//! graph and text-size budget. The extractor chosen for the MIME type reads
//! the file, builds a [`Resource`](quarry_domain::Resource) and attaches it to
//! the context. The miner reads the resource back and persists it.
//!
//! # Architecture
//!
//! ```text
//! Miner → ExtractionContext → Extractor → set_resource → Miner → MetadataStore
//! ```
//!
//! # Key Features
//!
//! - **Shared handle**: cloning a context acquires it, dropping releases it;
//!   the last holder frees the file identity and the attached resource
//! - **Composite files**: [`ExtractionContext::derive_content_id`] names the
//!   logical sub-resources of a file deterministically
//! - **Pluggable extractors**: the [`Extractor`] trait plus a MIME-keyed
//!   [`ExtractorRegistry`]
//! - **Generic extractors**: filesystem-level metadata for any file, plain
//!   text content for `text/*`
//!
//! # Example Usage
//!
//! ```no_run
//! use quarry_extract::{ExtractionContext, ExtractorRegistry};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ExtractorRegistry::with_builtins();
//! let ctx = ExtractionContext::new("notes.txt", "h:cafe", "text/plain", "", 0)?;
//!
//! if let Some(extractor) = registry.get_for_mime(ctx.mimetype()) {
//!     extractor.extract(&ctx)?;
//! }
//!
//! if let Some(resource) = ctx.resource() {
//!     println!("{} has types {:?}", resource.identifier(), resource.types());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod context;
mod error;
mod extractor;
mod file;
mod generic;
mod guarantee;
mod registry;
mod text;

pub use context::ExtractionContext;
pub use error::{ContextError, ExtractError};
pub use extractor::Extractor;
pub use file::SubjectFile;
pub use generic::{describe_file, FileExtractor};
pub use guarantee::{guarantee_date_from_file_mtime, guarantee_title_from_file, title_from_file_name};
pub use registry::ExtractorRegistry;
pub use text::{truncate_to_budget, TextExtractor};
