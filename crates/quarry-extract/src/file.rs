//! Identity of the file being extracted

use crate::error::ContextError;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// The file an extraction context is about
///
/// Holds the path as given, its absolute form (resolved against the working
/// directory at construction) and its `file://` URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectFile {
    path: PathBuf,
    absolute: PathBuf,
    uri: String,
}

impl SubjectFile {
    /// Create a subject file
    ///
    /// # Errors
    /// Returns [`ContextError::InvalidArgument`] if the path is empty or has no
    /// final file-name component (`/`, `..`).
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ContextError> {
        let path = path.into();

        if path.as_os_str().is_empty() {
            return Err(ContextError::InvalidArgument(
                "file path is empty".to_string(),
            ));
        }
        if path.file_name().is_none() {
            return Err(ContextError::InvalidArgument(format!(
                "'{}' does not name a file",
                path.display()
            )));
        }

        let absolute = std::path::absolute(&path).map_err(|e| {
            ContextError::InvalidArgument(format!(
                "cannot resolve '{}': {}",
                path.display(),
                e
            ))
        })?;
        let uri = file_uri(&absolute);

        Ok(Self {
            path,
            absolute,
            uri,
        })
    }

    /// Path as given at construction
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path, independent of later working-directory changes
    pub fn absolute_path(&self) -> &Path {
        &self.absolute
    }

    /// `file://` URI of the absolute path
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Final path component, if it is valid UTF-8
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Check whether the file currently exists
    pub fn exists(&self) -> bool {
        self.absolute.exists()
    }
}

impl fmt::Display for SubjectFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Build a `file://` URI from an absolute path
///
/// Each component is percent-encoded from its raw bytes, so paths that are
/// not valid UTF-8 still map to distinct URIs.
fn file_uri(path: &Path) -> String {
    let mut uri = String::from("file://");
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                uri.push('/');
                uri.push_str(&prefix.as_os_str().to_string_lossy().replace('\\', "/"));
            }
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => uri.push_str("/.."),
            Component::Normal(segment) => {
                uri.push('/');
                uri.push_str(&urlencoding::encode_binary(segment.as_encoded_bytes()));
            }
        }
    }
    if uri.len() == "file://".len() {
        uri.push('/');
    }
    uri
}
