//! Error types for the ingestion pipeline.
//!
//! Row-level problems ([`ValidationError`], and catalog errors captured in
//! outcomes) never escape a run; they become data in the batch summary.
//! Only [`PipelineError`] is returned to the caller.

use thiserror::Error;

/// Template resolution errors. Fatal: nothing is submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template already registered: {0}")]
    DuplicateTemplate(String),
}

/// Why a single row was rejected before submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("row {row}: missing required field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("row {row}: invalid value for '{field}': {reason}")]
    InvalidValue {
        row: usize,
        field: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn missing(row: usize, field: impl Into<String>) -> Self {
        Self::MissingField {
            row,
            field: field.into(),
        }
    }

    pub fn invalid(row: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            row,
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn row(&self) -> usize {
        match self {
            Self::MissingField { row, .. } | Self::InvalidValue { row, .. } => *row,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field, .. } | Self::InvalidValue { field, .. } => field,
        }
    }

    /// The message without the row prefix, for per-row reports.
    pub fn detail(&self) -> String {
        match self {
            Self::MissingField { field, .. } => format!("missing required field '{}'", field),
            Self::InvalidValue { field, reason, .. } => {
                format!("invalid value for '{}': {}", field, reason)
            }
        }
    }
}

/// Errors that abort a whole pipeline invocation.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The requested template does not exist.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The input could not be read or parsed.
    #[error("Source error: {0}")]
    SourceError(String),

    /// The pipeline was configured with unusable settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PipelineError {
    /// Create a source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        Self::SourceError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SourceError(err.to_string())
    }
}
