//! Quarry Domain Layer
//!
//! Core value types shared by the extraction pipeline: the resource graph an
//! extractor produces, the content-identifier rules that key it in the store,
//! and the trait boundary to the persistent store.
//!
//! ## Key Concepts
//!
//! - **Resource**: one logical entity's metadata (types, properties, relations)
//! - **Content identifier**: stable key for a file's content; suffixed to name
//!   the logical sub-resources of composite files
//! - **Graph**: the store partition a resource is written into (empty = default)
//!
//! ## Architecture
//!
//! - No I/O, no runtime
//! - Infrastructure implementations (SQLite store, extractors, miner) live in
//!   other crates and depend on this one

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod content_id;
pub mod resource;
pub mod traits;

// Re-exports for convenience
pub use content_id::{ContentId, SUFFIX_SEPARATOR};
pub use resource::{PropertyValue, Resource, RDF_TYPE};
pub use traits::{MetadataStore, ResourceQuery};
