//! Metrics collection for miner operations

use std::collections::BTreeMap;

/// Metrics collected while dispatching files
///
/// Tracks extractions per MIME type, stored resources and the ways a file
/// can fail to produce metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinerMetrics {
    /// Successful extractions per MIME type
    pub extracted: BTreeMap<String, usize>,

    /// Resources written to the store (sub-resources included)
    pub resources_stored: usize,

    /// Extractions that finished without attaching a resource
    pub empty: usize,

    /// Files with no matching extractor
    pub unsupported: usize,

    /// Extractions that returned an error
    pub failures: usize,

    /// Extractions abandoned after the timeout
    pub timeouts: usize,

    /// Total batch runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl MinerMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful extraction and the rows it stored
    pub fn record_extraction(&mut self, mimetype: &str, stored: usize) {
        let key = if mimetype.is_empty() { "unknown" } else { mimetype };
        *self.extracted.entry(key.to_string()).or_insert(0) += 1;
        self.resources_stored += stored;
    }

    /// Record an extraction that attached nothing
    pub fn record_empty(&mut self) {
        self.empty += 1;
    }

    /// Record a file no extractor handles
    pub fn record_unsupported(&mut self) {
        self.unsupported += 1;
    }

    /// Record a failed extraction
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Record a timed-out extraction
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    /// Get total successful extractions across all MIME types
    pub fn total_extracted(&self) -> usize {
        self.extracted.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Miner Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Extracted: {}", self.total_extracted()),
            format!("Resources stored: {}", self.resources_stored),
            format!("Empty: {}", self.empty),
            format!("Unsupported: {}", self.unsupported),
            format!("Failures: {}", self.failures),
            format!("Timeouts: {}", self.timeouts),
            format!("Total runtime: {}ms", self.total_runtime_ms),
        ];

        if !self.extracted.is_empty() {
            lines.push(String::new());
            lines.push("Extractions by type:".to_string());
            for (mimetype, count) in &self.extracted {
                lines.push(format!("  {}: {}", mimetype, count));
            }
        }

        lines.join("\n")
    }
}
