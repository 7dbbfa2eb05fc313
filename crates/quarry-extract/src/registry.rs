//! Extractor registry keyed by MIME type

use crate::extractor::Extractor;
use crate::generic::FileExtractor;
use crate::text::TextExtractor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of extractors
///
/// Lookup order for a MIME type: exact registration, then the major-type
/// wildcard (`image/*`), then the fallback extractor if one is set.
/// Registering an extractor under a name already in use replaces it.
pub struct ExtractorRegistry {
    /// Named extractors
    extractors: HashMap<String, Arc<dyn Extractor>>,
    /// Exact MIME type to extractor name
    mime_mapping: HashMap<String, String>,
    /// Major type (`image` for `image/*`) to extractor name
    wildcard_mapping: HashMap<String, String>,
    fallback: Option<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            mime_mapping: HashMap::new(),
            wildcard_mapping: HashMap::new(),
            fallback: None,
        }
    }

    /// Registry with the generic extractors: plain text for `text/*` and
    /// filesystem metadata as the fallback
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TextExtractor::new());
        registry.set_fallback(FileExtractor::new());
        registry
    }

    /// Register an extractor under its own name
    pub fn register<E: Extractor + 'static>(&mut self, extractor: E) {
        self.register_arc(Arc::new(extractor));
    }

    /// Register a shared extractor under its own name
    pub fn register_arc(&mut self, extractor: Arc<dyn Extractor>) {
        let name = extractor.name().to_string();

        if self.extractors.contains_key(&name) {
            debug!("Replacing extractor '{}'", name);
            self.mime_mapping.retain(|_, owner| *owner != name);
            self.wildcard_mapping.retain(|_, owner| *owner != name);
        }

        for mime in extractor.supported_types() {
            let mime = mime.to_ascii_lowercase();
            match mime.strip_suffix("/*") {
                Some(major) => {
                    self.wildcard_mapping.insert(major.to_string(), name.clone());
                }
                None => {
                    self.mime_mapping.insert(mime, name.clone());
                }
            }
        }

        self.extractors.insert(name, extractor);
    }

    /// Extractor used when no registration matches
    pub fn set_fallback<E: Extractor + 'static>(&mut self, extractor: E) {
        self.fallback = Some(Arc::new(extractor));
    }

    /// Get an extractor for a MIME type
    ///
    /// Parameters (`; charset=...`) and case are ignored.
    #[must_use]
    pub fn get_for_mime(&self, mimetype: &str) -> Option<Arc<dyn Extractor>> {
        let essence = mimetype
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if let Some(extractor) = self
            .mime_mapping
            .get(&essence)
            .and_then(|name| self.extractors.get(name))
        {
            return Some(extractor.clone());
        }

        let major = essence.split('/').next().unwrap_or_default();
        if let Some(extractor) = self
            .wildcard_mapping
            .get(major)
            .and_then(|name| self.extractors.get(name))
        {
            return Some(extractor.clone());
        }

        self.fallback.clone()
    }

    /// Get an extractor by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(name).cloned()
    }

    /// Names of all registered extractors, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered extractors, excluding the fallback
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Check if no extractor is registered
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtractError, ExtractionContext};

    struct Named {
        name: &'static str,
        types: &'static [&'static str],
    }

    impl Extractor for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn supported_types(&self) -> &[&str] {
            self.types
        }

        fn extract(&self, _ctx: &ExtractionContext) -> Result<(), ExtractError> {
            Ok(())
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ExtractorRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get_for_mime("text/plain").is_none());
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Named { name: "images", types: &["image/*"] });
        registry.register(Named { name: "png", types: &["image/png"] });

        assert_eq!(registry.get_for_mime("image/png").unwrap().name(), "png");
        assert_eq!(registry.get_for_mime("image/jpeg").unwrap().name(), "images");
        assert!(registry.get_for_mime("video/mp4").is_none());
    }

    #[test]
    fn test_parameters_and_case_ignored() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Named { name: "html", types: &["text/html"] });

        let found = registry.get_for_mime("Text/HTML; charset=utf-8");
        assert_eq!(found.unwrap().name(), "html");
    }

    #[test]
    fn test_fallback_used_last() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Named { name: "audio", types: &["audio/*"] });
        registry.set_fallback(Named { name: "any", types: &[] });

        assert_eq!(registry.get_for_mime("audio/mpeg").unwrap().name(), "audio");
        assert_eq!(registry.get_for_mime("application/x-unknown").unwrap().name(), "any");
        assert_eq!(registry.get_for_mime("").unwrap().name(), "any");
    }

    #[test]
    fn test_reregister_replaces_mappings() {
        let mut registry = ExtractorRegistry::new();
        registry.register(Named { name: "doc", types: &["application/pdf"] });
        registry.register(Named { name: "doc", types: &["application/msword"] });

        assert_eq!(registry.len(), 1);
        assert!(registry.get_for_mime("application/pdf").is_none());
        assert!(registry.get_for_mime("application/msword").is_some());
    }

    #[test]
    fn test_builtins() {
        let registry = ExtractorRegistry::with_builtins();

        assert_eq!(registry.names(), vec!["text"]);
        assert_eq!(registry.get_for_mime("text/markdown").unwrap().name(), "text");
        assert_eq!(registry.get_for_mime("audio/mpeg").unwrap().name(), "file");
    }
}
