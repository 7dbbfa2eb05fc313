//! Configuration for the miner
//!
//! Defines text budgets, extraction timeouts and dispatch concurrency.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on concurrently dispatched files
pub const MAX_CONCURRENT_LIMIT: usize = 256;

/// Configuration for the Miner
///
/// # Examples
///
/// ```
/// use quarry_miner::MinerConfig;
///
/// // Default configuration (balanced)
/// let config = MinerConfig::default();
/// assert_eq!(config.extraction_timeout_secs, 30);
///
/// // Fast, shallow extraction
/// let config = MinerConfig::aggressive();
/// assert_eq!(config.extraction_timeout_secs, 10);
///
/// // Slow, thorough extraction
/// let config = MinerConfig::lenient();
/// assert_eq!(config.max_text_size, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Maximum bytes of text content extracted per file
    /// Zero or less means unlimited
    /// Default: 1 MiB
    pub max_text_size: i64,

    /// Time an extractor may take for one file (in seconds)
    /// Default: 30
    pub extraction_timeout_secs: u64,

    /// Files extracted at the same time during a batch
    /// Default: 4
    pub max_concurrent: usize,

    /// Graph used when a task names none
    /// Default: "" (the default graph)
    #[serde(default)]
    pub default_graph: String,

    /// Remove stored sub-resources of a file before storing its new graph,
    /// so re-indexing never leaves stale `<id>/<suffix>` entries behind
    /// Default: true
    #[serde(default = "default_true")]
    pub retract_stale_subresources: bool,

    /// Record an error report when extraction of a file fails
    /// Default: true
    #[serde(default = "default_true")]
    pub report_errors: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            max_text_size: 1_048_576,
            extraction_timeout_secs: 30,
            max_concurrent: 4,
            default_graph: String::new(),
            retract_stale_subresources: true,
            report_errors: true,
        }
    }
}

impl MinerConfig {
    /// Aggressive preset: small text budget, short timeout, wide fan-out
    pub fn aggressive() -> Self {
        Self {
            max_text_size: 65_536,
            extraction_timeout_secs: 10,
            max_concurrent: 8,
            ..Self::default()
        }
    }

    /// Lenient preset: unlimited text, long timeout, narrow fan-out
    pub fn lenient() -> Self {
        Self {
            max_text_size: 0,
            extraction_timeout_secs: 120,
            max_concurrent: 2,
            ..Self::default()
        }
    }

    /// Get the extraction timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".to_string());
        }
        if self.max_concurrent > MAX_CONCURRENT_LIMIT {
            return Err(format!(
                "max_concurrent must be at most {}",
                MAX_CONCURRENT_LIMIT
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
