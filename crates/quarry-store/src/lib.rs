//! Quarry Storage Layer
//!
//! Implements the MetadataStore trait on SQLite.
//!
//! # Architecture
//!
//! - Each resource graph handed over by the miner is flattened: the root and
//!   every nested resource become one row keyed by `(graph, identifier)`
//! - Rows are upserted, so re-indexing a file updates its metadata instead of
//!   duplicating it
//! - Type tags are mirrored into a side table for type queries and statistics
//!
//! # Examples
//!
//! ```no_run
//! use quarry_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for resource operations
//! ```

#![warn(missing_docs)]

use quarry_domain::traits::{MetadataStore, ResourceQuery};
use quarry_domain::{ContentId, Resource};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Resource document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of MetadataStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks behind
/// a mutex, or give each thread its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use quarry_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("quarry.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Total number of stored resources across all graphs
    pub fn resource_count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Distinct graph names holding at least one resource
    pub fn graphs(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT graph FROM resources ORDER BY graph")?;
        let graphs = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(graphs)
    }

    /// Upsert every row of the flattened graph inside `tx`
    fn write_graph(
        tx: &Transaction<'_>,
        graph: &str,
        resource: &Resource,
    ) -> Result<usize, StoreError> {
        let rows = resource.flatten();
        let updated_at = Self::now();

        for row in &rows {
            let document = serde_json::to_string(row)?;

            tx.execute(
                "INSERT INTO resources (graph, identifier, document, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(graph, identifier) DO UPDATE SET
                 document = excluded.document, updated_at = excluded.updated_at",
                params![graph, row.identifier(), document, updated_at],
            )?;

            tx.execute(
                "DELETE FROM resource_types WHERE graph = ?1 AND identifier = ?2",
                params![graph, row.identifier()],
            )?;
            for rdf_type in row.types() {
                tx.execute(
                    "INSERT OR IGNORE INTO resource_types (graph, identifier, rdf_type)
                     VALUES (?1, ?2, ?3)",
                    params![graph, row.identifier(), rdf_type],
                )?;
            }
        }

        debug!(
            "Wrote {} resource(s) rooted at '{}' in graph '{}'",
            rows.len(),
            resource.identifier(),
            graph
        );

        Ok(rows.len())
    }

    /// Delete the rows derived from `base_id` inside `tx`
    fn retract_in(tx: &Transaction<'_>, graph: &str, base_id: &str) -> Result<usize, StoreError> {
        let prefix = ContentId::new(base_id)
            .map_err(StoreError::InvalidData)?
            .derived_prefix();

        tx.execute(
            "DELETE FROM resource_types
             WHERE graph = ?1 AND substr(identifier, 1, length(?2)) = ?2",
            params![graph, prefix],
        )?;
        let removed = tx.execute(
            "DELETE FROM resources
             WHERE graph = ?1 AND substr(identifier, 1, length(?2)) = ?2",
            params![graph, prefix],
        )?;

        if removed > 0 {
            debug!(
                "Retracted {} stale sub-resource(s) of '{}' in graph '{}'",
                removed, base_id, graph
            );
        }

        Ok(removed)
    }

    fn decode(document: &str) -> Result<Resource, StoreError> {
        let resource: Resource = serde_json::from_str(document)?;
        if resource.identifier().is_empty() {
            return Err(StoreError::InvalidData(
                "stored resource has an empty identifier".to_string(),
            ));
        }
        Ok(resource)
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl MetadataStore for SqliteStore {
    type Error = StoreError;

    fn insert_resource(&mut self, graph: &str, resource: &Resource) -> Result<usize, Self::Error> {
        let tx = self.conn.transaction()?;
        let written = Self::write_graph(&tx, graph, resource)?;
        tx.commit()?;
        Ok(written)
    }

    fn get_resource(&self, graph: &str, identifier: &str) -> Result<Option<Resource>, Self::Error> {
        let document: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM resources WHERE graph = ?1 AND identifier = ?2",
                params![graph, identifier],
                |row| row.get(0),
            )
            .optional()?;

        document.as_deref().map(Self::decode).transpose()
    }

    fn query_resources(&self, query: &ResourceQuery) -> Result<Vec<Resource>, Self::Error> {
        let mut sql = String::from("SELECT r.document FROM resources r WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(graph) = &query.graph {
            sql.push_str(" AND r.graph = ?");
            params.push(Box::new(graph.clone()));
        }

        if let Some(rdf_type) = &query.rdf_type {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM resource_types t
                   WHERE t.graph = r.graph AND t.identifier = r.identifier AND t.rdf_type = ?)",
            );
            params.push(Box::new(rdf_type.clone()));
        }

        if let Some(prefix) = &query.identifier_prefix {
            // substr() instead of LIKE: identifiers may contain % and _
            sql.push_str(" AND substr(r.identifier, 1, length(?)) = ?");
            params.push(Box::new(prefix.clone()));
            params.push(Box::new(prefix.clone()));
        }

        sql.push_str(" ORDER BY r.graph, r.identifier");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let documents = stmt
            .query_map(&param_refs[..], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        documents.iter().map(|d| Self::decode(d)).collect()
    }

    fn delete_resource(&mut self, graph: &str, identifier: &str) -> Result<bool, Self::Error> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM resource_types WHERE graph = ?1 AND identifier = ?2",
            params![graph, identifier],
        )?;
        let removed = tx.execute(
            "DELETE FROM resources WHERE graph = ?1 AND identifier = ?2",
            params![graph, identifier],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn retract_derived(&mut self, graph: &str, base_id: &str) -> Result<usize, Self::Error> {
        let tx = self.conn.transaction()?;
        let removed = Self::retract_in(&tx, graph, base_id)?;
        tx.commit()?;
        Ok(removed)
    }

    fn replace_resource(
        &mut self,
        graph: &str,
        base_id: &str,
        resource: &Resource,
        retract: bool,
    ) -> Result<usize, Self::Error> {
        // Dropping the transaction without commit rolls both steps back
        let tx = self.conn.transaction()?;
        if retract {
            Self::retract_in(&tx, graph, base_id)?;
        }
        let written = Self::write_graph(&tx, graph, resource)?;
        tx.commit()?;
        Ok(written)
    }

    fn type_counts(&self) -> Result<Vec<(String, usize)>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT rdf_type, COUNT(*) FROM resource_types GROUP BY rdf_type ORDER BY rdf_type",
        )?;

        let counts = stmt
            .query_map([], |row| {
                let rdf_type: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((rdf_type, count as usize))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
