//! The extraction context handed from the miner to an extractor

use crate::error::ContextError;
use crate::file::SubjectFile;
use quarry_domain::{ContentId, Resource};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// Everything an extractor needs to know about one file, plus a slot for
/// the metadata it produces
///
/// A context is a shared handle. [`acquire`](Self::acquire) (or `clone`)
/// adds a holder, [`release`](Self::release) (or dropping the handle) removes
/// one. When the last holder lets go, the file identity and any attached
/// resource are freed. A context is never freed while a holder still
/// references it.
///
/// The descriptive fields are fixed at construction. Only the attached
/// resource changes afterwards, through [`set_resource`](Self::set_resource).
///
/// Handles may be sent to and shared between threads.
#[derive(Clone)]
pub struct ExtractionContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    file: SubjectFile,
    content_id: ContentId,
    mimetype: String,
    graph: String,
    max_text_size: i64,
    resource: RwLock<Option<Arc<Resource>>>,
}

impl Drop for ContextInner {
    fn drop(&mut self) {
        trace!("Extraction context for '{}' freed", self.content_id);
    }
}

impl ExtractionContext {
    /// Create a context with one holder and no resource attached
    ///
    /// `mimetype` and `graph` may be empty. A `max_text_size` of zero or less
    /// means no limit.
    ///
    /// # Errors
    /// Returns [`ContextError::InvalidArgument`] if the file path is empty or
    /// does not name a file, or if `content_id` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_extract::ExtractionContext;
    ///
    /// let ctx = ExtractionContext::new("song.mp3", "h:deadbeef", "audio/mpeg", "", 0).unwrap();
    /// assert_eq!(ctx.content_id(), "h:deadbeef");
    /// assert!(ctx.resource().is_none());
    ///
    /// assert!(ExtractionContext::new("song.mp3", "", "audio/mpeg", "", 0).is_err());
    /// ```
    pub fn new(
        file: impl AsRef<Path>,
        content_id: &str,
        mimetype: &str,
        graph: &str,
        max_text_size: i64,
    ) -> Result<Self, ContextError> {
        let file = SubjectFile::new(file.as_ref())?;
        Self::for_file(file, content_id, mimetype, graph, max_text_size)
    }

    /// Create a context for an already validated [`SubjectFile`]
    ///
    /// # Errors
    /// Returns [`ContextError::InvalidArgument`] if `content_id` is empty.
    pub fn for_file(
        file: SubjectFile,
        content_id: &str,
        mimetype: &str,
        graph: &str,
        max_text_size: i64,
    ) -> Result<Self, ContextError> {
        let content_id = ContentId::new(content_id).map_err(ContextError::InvalidArgument)?;

        trace!(
            "Extraction context created for '{}' as '{}'",
            file.path().display(),
            content_id
        );

        Ok(Self {
            inner: Arc::new(ContextInner {
                file,
                content_id,
                mimetype: mimetype.to_string(),
                graph: graph.to_string(),
                max_text_size,
                resource: RwLock::new(None),
            }),
        })
    }

    /// Register an additional holder
    ///
    /// Returns a handle to the same context; the context stays alive at
    /// least until that handle is released.
    pub fn acquire(&self) -> Self {
        self.clone()
    }

    /// Give up this holder's claim
    ///
    /// Consuming `self` makes releasing twice through the same handle
    /// impossible. The last release frees the context.
    pub fn release(self) {
        drop(self);
    }

    /// Number of handles currently holding this context
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether two handles refer to the same context
    pub fn same_context(&self, other: &ExtractionContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The file under extraction
    pub fn file(&self) -> &SubjectFile {
        &self.inner.file
    }

    /// Path of the file under extraction
    pub fn path(&self) -> &Path {
        self.inner.file.path()
    }

    /// The base content identifier
    pub fn content_id(&self) -> &str {
        self.inner.content_id.as_str()
    }

    /// Derive an identifier for a logical sub-resource of the file
    ///
    /// Without a suffix this is the base identifier; with one it is
    /// `<base>/<suffix>`. Deterministic, and distinct suffixes give distinct
    /// identifiers.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_extract::ExtractionContext;
    ///
    /// let ctx = ExtractionContext::new("archive.mbox", "h:feedface", "application/mbox", "", 0).unwrap();
    /// assert_eq!(ctx.derive_content_id(None), "h:feedface");
    /// assert_eq!(ctx.derive_content_id(Some("0")), "h:feedface/0");
    /// ```
    pub fn derive_content_id(&self, suffix: Option<&str>) -> String {
        self.inner.content_id.derive(suffix)
    }

    /// MIME type the file was classified as (may be empty)
    pub fn mimetype(&self) -> &str {
        &self.inner.mimetype
    }

    /// Destination graph for the extracted metadata (may be empty)
    pub fn graph(&self) -> &str {
        &self.inner.graph
    }

    /// Maximum amount of text content to extract, as given
    pub fn max_text_size(&self) -> i64 {
        self.inner.max_text_size
    }

    /// Text limit in bytes, or `None` when unlimited
    pub fn text_budget(&self) -> Option<usize> {
        match self.inner.max_text_size {
            size if size <= 0 => None,
            size => Some(usize::try_from(size).unwrap_or(usize::MAX)),
        }
    }

    /// The attached resource, if an extractor has produced one
    ///
    /// The returned handle keeps the resource alive independently of the
    /// context; it does not observe later attachments.
    pub fn resource(&self) -> Option<Arc<Resource>> {
        self.inner
            .resource
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a resource is attached
    pub fn has_resource(&self) -> bool {
        self.inner
            .resource
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Attach the extracted resource, replacing any previous one
    ///
    /// The context drops its hold on the previous resource before storing
    /// the new one; the latest attachment wins.
    pub fn set_resource(&self, resource: Resource) {
        let resource = Arc::new(resource);
        let mut slot = self
            .inner
            .resource
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = slot.take() {
            debug!(
                "Replacing resource '{}' with '{}' for '{}'",
                previous.identifier(),
                resource.identifier(),
                self.inner.content_id
            );
            drop(previous);
        }

        *slot = Some(resource);
    }
}

impl fmt::Debug for ExtractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionContext")
            .field("file", &self.inner.file.path())
            .field("content_id", &self.inner.content_id.as_str())
            .field("mimetype", &self.inner.mimetype)
            .field("graph", &self.inner.graph)
            .field("max_text_size", &self.inner.max_text_size)
            .field("has_resource", &self.has_resource())
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Weak;

    fn song() -> ExtractionContext {
        ExtractionContext::new("song.mp3", "h:deadbeef", "audio/mpeg", "", 0).unwrap()
    }

    #[test]
    fn test_new_context_fields() {
        let ctx = song();

        assert_eq!(ctx.path(), Path::new("song.mp3"));
        assert_eq!(ctx.content_id(), "h:deadbeef");
        assert_eq!(ctx.mimetype(), "audio/mpeg");
        assert_eq!(ctx.graph(), "");
        assert_eq!(ctx.max_text_size(), 0);
        assert_eq!(ctx.ref_count(), 1);
        assert!(ctx.resource().is_none());
        assert!(!ctx.has_resource());
    }

    #[test]
    fn test_empty_content_id_rejected() {
        let result = ExtractionContext::new("song.mp3", "", "audio/mpeg", "", 0);
        assert!(matches!(result, Err(ContextError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_file_rejected() {
        let result = ExtractionContext::new("", "h:deadbeef", "audio/mpeg", "", 0);
        assert!(matches!(result, Err(ContextError::InvalidArgument(_))));
    }

    #[test]
    fn test_empty_mimetype_and_graph_allowed() {
        let ctx = ExtractionContext::new("blob", "h:1", "", "", -1).unwrap();
        assert_eq!(ctx.mimetype(), "");
        assert_eq!(ctx.graph(), "");
    }

    #[test]
    fn test_text_budget() {
        let unlimited = ExtractionContext::new("a.txt", "h:1", "text/plain", "", 0).unwrap();
        assert_eq!(unlimited.text_budget(), None);

        let negative = ExtractionContext::new("a.txt", "h:1", "text/plain", "", -5).unwrap();
        assert_eq!(negative.text_budget(), None);

        let limited = ExtractionContext::new("a.txt", "h:1", "text/plain", "", 1024).unwrap();
        assert_eq!(limited.max_text_size(), 1024);
        assert_eq!(limited.text_budget(), Some(1024));
    }

    #[test]
    fn test_derive_content_id() {
        let ctx = ExtractionContext::new("archive.mbox", "h:feedface", "application/mbox", "", 0)
            .unwrap();

        assert_eq!(ctx.derive_content_id(None), "h:feedface");
        assert_eq!(ctx.derive_content_id(Some("0")), "h:feedface/0");
        assert_eq!(ctx.derive_content_id(Some("1")), "h:feedface/1");
        assert_eq!(ctx.derive_content_id(Some("0")), ctx.derive_content_id(Some("0")));
    }

    #[test]
    fn test_acquire_and_release_counts() {
        let ctx = song();
        let second = ctx.acquire();
        let third = second.acquire();

        assert_eq!(ctx.ref_count(), 3);
        assert!(ctx.same_context(&third));

        second.release();
        assert_eq!(ctx.ref_count(), 2);
        third.release();
        assert_eq!(ctx.ref_count(), 1);
    }

    #[test]
    fn test_set_resource_stores_resource() {
        let ctx = song();
        let mut resource = Resource::new(ctx.derive_content_id(None));
        resource.add_type("nmm:MusicPiece");
        resource.set_string("nie:title", "Intro");

        ctx.set_resource(resource.clone());

        let attached = ctx.resource().unwrap();
        assert_eq!(*attached, resource);
        assert!(ctx.has_resource());
    }

    #[test]
    fn test_set_resource_releases_previous() {
        let ctx = song();

        ctx.set_resource(Resource::new("R1"));
        let r1: Weak<Resource> = Arc::downgrade(&ctx.resource().unwrap());
        assert!(r1.upgrade().is_some());

        ctx.set_resource(Resource::new("R2"));

        assert!(r1.upgrade().is_none(), "previous resource should be released");
        assert_eq!(ctx.resource().unwrap().identifier(), "R2");
    }

    #[test]
    fn test_outside_handle_survives_replacement() {
        let ctx = song();
        ctx.set_resource(Resource::new("R1"));
        let kept = ctx.resource().unwrap();

        ctx.set_resource(Resource::new("R2"));

        assert_eq!(kept.identifier(), "R1");
        assert_eq!(ctx.resource().unwrap().identifier(), "R2");
    }

    #[test]
    fn test_same_resource_twice() {
        let ctx = song();
        let resource = Resource::new("R1");

        ctx.set_resource(resource.clone());
        ctx.set_resource(resource.clone());

        assert_eq!(*ctx.resource().unwrap(), resource);
    }

    #[test]
    fn test_last_release_frees_resource() {
        let ctx = song();
        ctx.set_resource(Resource::new("R1"));
        let weak = Arc::downgrade(&ctx.resource().unwrap());

        let other = ctx.acquire();
        ctx.release();
        assert!(weak.upgrade().is_some(), "still held by the second handle");

        other.release();
        assert!(weak.upgrade().is_none(), "last release frees the resource");
    }

    #[test]
    fn test_clones_share_attachment() {
        let ctx = song();
        let other = ctx.acquire();

        other.set_resource(Resource::new("R1"));

        assert_eq!(ctx.resource().unwrap().identifier(), "R1");
    }

    #[test]
    fn test_debug_output() {
        let ctx = song();
        let debug = format!("{:?}", ctx);
        assert!(debug.contains("h:deadbeef"));
        assert!(debug.contains("ref_count: 1"));
    }
}
