//! Filesystem-level metadata, available for any file

use crate::context::ExtractionContext;
use crate::error::ExtractError;
use crate::extractor::Extractor;
use crate::guarantee::{guarantee_date_from_file_mtime, guarantee_title_from_file};
use quarry_domain::Resource;
use tracing::debug;

/// Build the file-level resource every extractor starts from
///
/// The resource is rooted at the base content identifier and typed
/// `nfo:FileDataObject`, with name, size, modification time, URL, MIME type
/// and a guaranteed title.
///
/// # Errors
/// Returns [`ExtractError::Io`] if the file's metadata cannot be read.
pub fn describe_file(ctx: &ExtractionContext) -> Result<Resource, ExtractError> {
    let metadata = std::fs::metadata(ctx.path())?;
    if metadata.is_dir() {
        return Err(ExtractError::Failed(format!(
            "'{}' is a directory",
            ctx.path().display()
        )));
    }

    let mut resource = Resource::new(ctx.derive_content_id(None));
    resource.add_type("nfo:FileDataObject");
    resource.set_uri("nie:url", ctx.file().uri());
    resource.set_int(
        "nfo:fileSize",
        i64::try_from(metadata.len()).unwrap_or(i64::MAX),
    );

    if let Some(name) = ctx.file().file_name() {
        resource.set_string("nfo:fileName", name);
    }
    if !ctx.mimetype().is_empty() {
        resource.set_string("nie:mimeType", ctx.mimetype());
    }

    guarantee_date_from_file_mtime(&mut resource, "nfo:fileLastModified", None, ctx.file());
    guarantee_title_from_file(&mut resource, "nie:title", None, ctx.file());

    Ok(resource)
}

/// Extractor for files no specific extractor handles
#[derive(Debug, Default)]
pub struct FileExtractor;

impl FileExtractor {
    /// Create a new file extractor
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for FileExtractor {
    fn name(&self) -> &str {
        "file"
    }

    fn supported_types(&self) -> &[&str] {
        &[]
    }

    fn extract(&self, ctx: &ExtractionContext) -> Result<(), ExtractError> {
        let resource = describe_file(ctx)?;
        debug!(
            "Described '{}' with {} properties",
            ctx.path().display(),
            resource.property_count()
        );
        ctx.set_resource(resource);
        Ok(())
    }
}
