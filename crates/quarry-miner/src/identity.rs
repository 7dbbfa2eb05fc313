//! Content identifiers and MIME types for files the miner picks up

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

/// Prefix of identifiers produced by [`file_content_id`]
pub const FILE_ID_SCHEME: &str = "urn:fileid:";

/// MIME type used when the extension is unknown
pub const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// Path used for hashing: canonical if the file exists, absolute otherwise
fn identity_path(path: &Path) -> io::Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(canonical) => Ok(canonical),
        Err(_) => std::path::absolute(path),
    }
}

/// Stable content identifier for a file
///
/// `urn:fileid:` followed by the hex SHA-256 of the canonical absolute path,
/// so re-indexing the same file updates rather than duplicates its metadata.
///
/// # Errors
/// Returns an I/O error if the path is empty.
pub fn file_content_id(path: &Path) -> io::Result<String> {
    let path = identity_path(path)?;
    let digest = Sha256::digest(path.as_os_str().as_encoded_bytes());
    Ok(format!("{}{}", FILE_ID_SCHEME, hex::encode(digest)))
}

/// Guess a MIME type from the file extension
///
/// ```
/// use quarry_miner::guess_mimetype;
/// use std::path::Path;
///
/// assert_eq!(guess_mimetype(Path::new("song.MP3")), "audio/mpeg");
/// assert_eq!(guess_mimetype(Path::new("mystery")), "application/octet-stream");
/// ```
pub fn guess_mimetype(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_MIMETYPE)
}
