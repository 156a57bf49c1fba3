//! Dependency initialization and wiring for the ingester.

use std::sync::Arc;

use clap::ValueEnum;
use tracing::info;

use crate::config::IngestSettings;
use crate::IngesterError;
use lineage_pipeline::IngestionPipeline;
use lineage_repository::{CatalogClient, HttpCatalogClient, InMemoryCatalogClient};

/// Which catalog implementation to submit to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogBackend {
    /// The remote catalog API.
    Http,
    /// A process-local store; nothing outlives the run.
    Memory,
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured pipeline ready to run.
    pub pipeline: IngestionPipeline,
}

impl Dependencies {
    /// Build the catalog client and pipeline from resolved settings.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IngesterError)` - If the catalog client or submitter settings are invalid
    pub fn new(settings: &IngestSettings, backend: CatalogBackend) -> Result<Self, IngesterError> {
        info!(
            backend = ?backend,
            catalog_url = %settings.catalog.base_url,
            max_concurrency = settings.submitter.max_concurrency,
            chunk_size = settings.submitter.chunk_size,
            max_retries = settings.submitter.retry.max_retries,
            "Initializing dependencies"
        );

        let client: Arc<dyn CatalogClient> = match backend {
            CatalogBackend::Http => Arc::new(
                HttpCatalogClient::new(settings.catalog.clone()).map_err(|e| {
                    IngesterError::config(format!("Failed to create catalog client: {}", e))
                })?,
            ),
            CatalogBackend::Memory => Arc::new(InMemoryCatalogClient::new()),
        };

        let pipeline = IngestionPipeline::with_config(client, settings.submitter.clone())?;

        Ok(Self { pipeline })
    }
}
