//! Command implementations.

pub mod extract;
pub mod index;
pub mod status;

pub use self::extract::{execute_extract, extract_resource};
pub use self::index::execute_index;
pub use self::status::execute_status;

use crate::error::Result;
use quarry_store::SqliteStore;
use std::fs;
use std::path::Path;

/// Open the metadata database, creating its directory if needed.
pub fn open_store(database: &Path) -> Result<SqliteStore> {
    if let Some(parent) = database.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(SqliteStore::new(database)?)
}
