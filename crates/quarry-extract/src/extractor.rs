//! The extractor contract

use crate::context::ExtractionContext;
use crate::error::ExtractError;

/// A type-specific metadata extractor
///
/// Given a context, an extractor reads the file, builds a resource graph
/// rooted at [`ExtractionContext::derive_content_id`]`(None)` and attaches it
/// with [`ExtractionContext::set_resource`]. For composite files each logical
/// sub-resource uses a derived identifier with a distinct suffix.
///
/// An extractor borrows the context for the duration of the call. To keep it
/// longer (for instance on a helper thread) it must take its own handle with
/// [`ExtractionContext::acquire`].
///
/// Returning `Ok(())` without attaching a resource is valid: the file yielded
/// no metadata.
pub trait Extractor: Send + Sync {
    /// Short name for logs and reports
    fn name(&self) -> &str;

    /// MIME types handled, either exact (`audio/mpeg`) or a major-type
    /// wildcard (`audio/*`)
    fn supported_types(&self) -> &[&str];

    /// Extract metadata for the context's file
    fn extract(&self, ctx: &ExtractionContext) -> Result<(), ExtractError>;

    /// Check whether this extractor declares support for a MIME type
    fn supports(&self, mimetype: &str) -> bool {
        let major = mimetype.split('/').next().unwrap_or_default();
        self.supported_types().iter().any(|declared| {
            *declared == mimetype
                || declared
                    .strip_suffix("/*")
                    .is_some_and(|declared_major| declared_major == major)
        })
    }
}
