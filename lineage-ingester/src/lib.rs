//! # Lineage Ingester
//!
//! Entry point and configuration for running batch relationship ingestion
//! from the command line.

pub mod config;
pub mod logging;
pub mod report;

pub use config::{CatalogBackend, Dependencies, IngestSettings};

use thiserror::Error;

/// Errors that can occur during ingester initialization or execution.
#[derive(Error, Debug)]
pub enum IngesterError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] lineage_pipeline::PipelineError),

    /// Catalog client error.
    #[error("Catalog error: {0}")]
    ApiError(#[from] lineage_repository::ApiError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IngesterError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
