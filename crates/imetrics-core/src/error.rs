//! Error types for imetrics-core
//!
//! Structural problems (bad spot time, bad config, unreadable files) are hard
//! errors. Statistical degeneracies never are: they surface as zeroed values
//! and low confidence in the analysis output.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for iMetrics operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // Input Errors
    // ===================
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse JSON in {source_name}: {message}")]
    JsonParse {
        source_name: String,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML in {path}: {message}")]
    TomlParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        CoreError::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result alias used across the core
pub type Result<T> = std::result::Result<T, CoreError>;

/// Individual entry in a load report
///
/// Every entry is a warning: the record was adjusted or skipped and the
/// load went on.
#[derive(Debug, Clone)]
pub struct LoadError {
    pub source: String,
    pub message: String,
    /// Actionable suggestion for user (optional)
    pub suggestion: Option<String>,
}

impl LoadError {
    pub fn warning(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add an actionable suggestion to this entry
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Report of problems encountered while ingesting samples or spots
///
/// Malformed records are skipped and recorded here instead of failing
/// the whole load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub errors: Vec<LoadError>,
    pub records_read: usize,
    pub records_skipped: usize,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.errors.push(LoadError::warning(source, message));
    }

    /// Record a skipped record with its reason
    pub fn skip(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.records_skipped += 1;
        self.add_warning(source, message);
    }

    /// Returns true if any record was adjusted or skipped
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_report_counts_skips_and_adjustments() {
        let mut report = LoadReport::new();
        assert!(!report.has_errors());

        report.add_warning("samples[3]", "negative sessions clamped to 0");
        report.add_error(
            LoadError::warning("samples[5]", "negative bounces clamped to 0")
                .with_suggestion("Check the export"),
        );
        report.skip("samples[7]", "unparsable timestamp");

        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.records_skipped, 1);
        assert!(report.has_errors());
        assert_eq!(report.errors[1].suggestion.as_deref(), Some("Check the export"));
        assert_eq!(report.errors[2].source, "samples[7]");
    }

    #[test]
    fn test_invalid_input_display() {
        let err = CoreError::invalid_input("spot dateTime is missing");
        assert_eq!(err.to_string(), "Invalid input: spot dateTime is missing");
    }
}
