//! Trait definitions for external interactions
//!
//! These traits define the boundary between the extraction pipeline and
//! infrastructure. Implementations live in other crates.

use crate::Resource;

/// Trait for persisting and querying resource graphs
///
/// Implemented by the infrastructure layer (quarry-store). Resources are
/// keyed by `(graph, identifier)`; the empty graph name is the default graph.
pub trait MetadataStore {
    /// Error type for store operations
    type Error;

    /// Insert or replace the graph rooted at `resource`
    ///
    /// Nested resources are persisted as their own rows. Returns the number
    /// of resources written.
    fn insert_resource(&mut self, graph: &str, resource: &Resource) -> Result<usize, Self::Error>;

    /// Get a resource by identifier
    ///
    /// Relations come back as URI references, not nested resources.
    fn get_resource(&self, graph: &str, identifier: &str) -> Result<Option<Resource>, Self::Error>;

    /// Query resources matching criteria
    fn query_resources(&self, query: &ResourceQuery) -> Result<Vec<Resource>, Self::Error>;

    /// Delete one resource; returns whether it existed
    fn delete_resource(&mut self, graph: &str, identifier: &str) -> Result<bool, Self::Error>;

    /// Delete every resource whose identifier was derived from `base_id`
    ///
    /// Used to drop sub-resources left behind by a previous extraction of the
    /// same physical file. Returns the number of resources removed.
    fn retract_derived(&mut self, graph: &str, base_id: &str) -> Result<usize, Self::Error>;

    /// Store a fresh extraction of the file identified by `base_id`
    ///
    /// With `retract` set, resources derived from `base_id` are dropped
    /// before `resource` is written. Both steps commit together: on error the
    /// previously stored rows are left untouched. Returns the number of
    /// resources written.
    fn replace_resource(
        &mut self,
        graph: &str,
        base_id: &str,
        resource: &Resource,
        retract: bool,
    ) -> Result<usize, Self::Error>;

    /// Count resources per type tag, across all graphs
    fn type_counts(&self) -> Result<Vec<(String, usize)>, Self::Error>;
}

/// Query criteria for retrieving resources
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    /// Filter by graph
    pub graph: Option<String>,

    /// Filter by type tag
    pub rdf_type: Option<String>,

    /// Filter by identifier prefix
    pub identifier_prefix: Option<String>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl ResourceQuery {
    /// Query everything in one graph
    pub fn in_graph(graph: impl Into<String>) -> Self {
        Self {
            graph: Some(graph.into()),
            ..Default::default()
        }
    }

    /// Restrict to a type tag
    pub fn with_type(mut self, rdf_type: impl Into<String>) -> Self {
        self.rdf_type = Some(rdf_type.into());
        self
    }

    /// Restrict to identifiers starting with `prefix`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.identifier_prefix = Some(prefix.into());
        self
    }

    /// Cap the number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
