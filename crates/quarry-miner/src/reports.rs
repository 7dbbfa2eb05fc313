//! Error reports for files whose extraction failed
//!
//! Each report is a small TOML file named after the SHA-256 of the file URI,
//! so a later attempt on the same file overwrites or removes it.

use crate::error::MinerError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const REPORT_EXTENSION: &str = "toml";

/// A recorded extraction failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// URI of the file
    pub uri: String,
    /// Path of the file
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
    /// MIME type the file was dispatched as
    #[serde(default)]
    pub mimetype: String,
    /// Content identifier the file was dispatched with
    #[serde(default)]
    pub content_id: String,
    /// When the failure was recorded (RFC 3339)
    pub recorded_at: String,
}

impl ErrorReport {
    /// Create a report stamped with the current time
    ///
    /// A relative `path` is resolved against the working directory now, so
    /// listing from elsewhere still finds the file.
    pub fn new(
        uri: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        Self {
            uri: uri.into(),
            path,
            message: message.into(),
            mimetype: String::new(),
            content_id: String::new(),
            recorded_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }

    /// Set the MIME type
    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = mimetype.into();
        self
    }

    /// Set the content identifier
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = content_id.into();
        self
    }

    /// Check whether any term occurs in the path or URI
    ///
    /// No terms matches everything.
    pub fn matches(&self, terms: &[String]) -> bool {
        if terms.is_empty() {
            return true;
        }
        let path = self.path.to_string_lossy();
        terms
            .iter()
            .any(|term| path.contains(term.as_str()) || self.uri.contains(term.as_str()))
    }
}

/// Directory of error reports
#[derive(Debug, Clone)]
pub struct ErrorReports {
    dir: PathBuf,
}

impl ErrorReports {
    /// Use `dir` for reports; it is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default report directory: `<cache>/quarry/errors`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|cache| cache.join("quarry").join("errors"))
    }

    /// Report directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn report_path(&self, uri: &str) -> PathBuf {
        let name = hex::encode(Sha256::digest(uri.as_bytes()));
        self.dir.join(format!("{}.{}", name, REPORT_EXTENSION))
    }

    /// Write a report, replacing any earlier one for the same URI
    pub fn record(&self, report: &ErrorReport) -> Result<PathBuf, MinerError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.report_path(&report.uri);
        let contents = toml::to_string_pretty(report)
            .map_err(|e| MinerError::Report(format!("Failed to serialize report: {}", e)))?;
        fs::write(&path, contents)?;

        debug!("Recorded error report for '{}'", report.uri);
        Ok(path)
    }

    /// Read the report for a URI
    pub fn get(&self, uri: &str) -> Result<Option<ErrorReport>, MinerError> {
        match fs::read_to_string(self.report_path(uri)) {
            Ok(contents) => Self::parse(&contents).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the report for a URI, returning whether one existed
    pub fn remove(&self, uri: &str) -> Result<bool, MinerError> {
        match fs::remove_file(self.report_path(uri)) {
            Ok(()) => {
                debug!("Removed error report for '{}'", uri);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Reports matching any of `terms`, sorted by path
    ///
    /// Reports about files that no longer exist are deleted instead of
    /// returned. Unreadable report files are skipped.
    pub fn list(&self, terms: &[String]) -> Result<Vec<ErrorReport>, MinerError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reports = Vec::new();
        for entry in entries {
            let report_file = entry?.path();
            if report_file.extension().and_then(|e| e.to_str()) != Some(REPORT_EXTENSION) {
                continue;
            }

            let report = match fs::read_to_string(&report_file)
                .map_err(MinerError::from)
                .and_then(|contents| Self::parse(&contents))
            {
                Ok(report) => report,
                Err(e) => {
                    warn!("Skipping report '{}': {}", report_file.display(), e);
                    continue;
                }
            };

            // Relative paths cannot be checked reliably from here
            if report.path.is_absolute() && !report.path.exists() {
                debug!("Pruning report for deleted file '{}'", report.path.display());
                if let Err(e) = fs::remove_file(&report_file) {
                    warn!("Could not prune '{}': {}", report_file.display(), e);
                }
                continue;
            }

            if report.matches(terms) {
                reports.push(report);
            }
        }

        reports.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(reports)
    }

    fn parse(contents: &str) -> Result<ErrorReport, MinerError> {
        toml::from_str(contents)
            .map_err(|e| MinerError::Report(format!("Failed to parse report: {}", e)))
    }
}
