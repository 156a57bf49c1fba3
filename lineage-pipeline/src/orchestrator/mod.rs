//! Pipeline orchestration.
//!
//! [`IngestionPipeline`] composes the stages for one batch:
//! resolve template → validate → build → submit → aggregate.

use std::sync::Arc;

use chrono::Utc;
use lineage_repository::CatalogClient;
use lineage_shared::{BatchSummary, RawRecord, RecordState, Relationship, SubmissionOutcome};
use tracing::{debug, info, instrument};

use crate::aggregator::ResultAggregator;
use crate::builder::RelationshipBuilder;
use crate::cancel::CancellationSignal;
use crate::errors::PipelineError;
use crate::submitter::{BatchSubmitter, SubmitterConfig};
use crate::template::{Template, TemplateRegistry};
use crate::validator::RecordValidator;

const DRY_RUN_REASON: &str = "dry run";

/// Batch relationship-ingestion pipeline.
///
/// # Example
///
/// ```ignore
/// let pipeline = IngestionPipeline::with_config(client, SubmitterConfig::default())?;
/// let summary = pipeline.run("basic_lineage", records).await?;
/// println!("{} created, {} failed", summary.created, summary.failed);
/// ```
pub struct IngestionPipeline {
    registry: Arc<TemplateRegistry>,
    validator: RecordValidator,
    builder: RelationshipBuilder,
    submitter: BatchSubmitter,
}

impl IngestionPipeline {
    /// Create a pipeline with default submission settings and the built-in
    /// templates.
    pub fn new(client: Arc<dyn CatalogClient>) -> Result<Self, PipelineError> {
        Self::with_config(client, SubmitterConfig::default())
    }

    pub fn with_config(
        client: Arc<dyn CatalogClient>,
        config: SubmitterConfig,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            registry: Arc::new(TemplateRegistry::with_defaults()),
            validator: RecordValidator::new(),
            builder: RelationshipBuilder::new(),
            submitter: BatchSubmitter::new(client, config)?,
        })
    }

    /// Replace the template registry.
    pub fn with_registry(mut self, registry: Arc<TemplateRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Run a batch to completion.
    ///
    /// Only schema and source errors escape; every row-level problem is
    /// reported in the returned summary.
    pub async fn run(
        &self,
        template: &str,
        records: Vec<RawRecord>,
    ) -> Result<BatchSummary, PipelineError> {
        self.run_with_cancellation(template, records, &CancellationSignal::new())
            .await
    }

    /// Run a batch, stopping new submissions once `cancel` is raised.
    #[instrument(skip(self, records, cancel), fields(rows = records.len()))]
    pub async fn run_with_cancellation(
        &self,
        template: &str,
        records: Vec<RawRecord>,
        cancel: &CancellationSignal,
    ) -> Result<BatchSummary, PipelineError> {
        let started_at = Utc::now();
        let template = self.registry.get(template)?;
        check_row_indices(&records)?;

        let aggregator = Arc::new(ResultAggregator::new(records.len()));
        let built = self.prepare(&template, &records, &aggregator);

        info!(
            template = template.name(),
            total = records.len(),
            valid = built.len(),
            "Validated batch"
        );

        let report = self
            .submitter
            .submit(built, Arc::clone(&aggregator), cancel)
            .await;

        let summary = aggregator.finish(report.aborted, report.cancelled, started_at);
        info!(
            total = summary.total_rows,
            created = summary.created,
            duplicates = summary.duplicates,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch completed"
        );
        Ok(summary)
    }

    /// Validate and build every row without contacting the catalog.
    ///
    /// Valid rows are reported as skipped with reason "dry run".
    pub fn validate_only(
        &self,
        template: &str,
        records: Vec<RawRecord>,
    ) -> Result<BatchSummary, PipelineError> {
        let started_at = Utc::now();
        let template = self.registry.get(template)?;
        check_row_indices(&records)?;

        let aggregator = ResultAggregator::new(records.len());
        for (row_index, relationship) in self.prepare(&template, &records, &aggregator) {
            aggregator.record(SubmissionOutcome::skipped(
                row_index,
                Some(relationship),
                DRY_RUN_REASON,
            ));
        }

        Ok(aggregator.finish(None, false, started_at))
    }

    /// Validate and build each row, recording failures in the aggregator.
    fn prepare(
        &self,
        template: &Template,
        records: &[RawRecord],
        aggregator: &ResultAggregator,
    ) -> Vec<(usize, Relationship)> {
        let mut built = Vec::with_capacity(records.len());
        for raw in records {
            let row_index = raw.row_index;
            match self.validator.validate(raw, template) {
                Ok(validated) => {
                    aggregator.advance(row_index, RecordState::Validated);
                    let relationship = self.builder.build(validated);
                    aggregator.advance(row_index, RecordState::Built);
                    built.push((row_index, relationship));
                }
                Err(e) => {
                    debug!(row_index, error = %e, "Row failed validation");
                    aggregator.record(SubmissionOutcome::failed(row_index, None, e.detail(), 0));
                }
            }
        }
        built
    }
}

/// Row indices must equal source position so every row owns one slot.
fn check_row_indices(records: &[RawRecord]) -> Result<(), PipelineError> {
    match records
        .iter()
        .enumerate()
        .find(|(position, record)| record.row_index != *position)
    {
        Some((position, record)) => Err(PipelineError::source(format!(
            "record at position {} has row index {}",
            position, record.row_index
        ))),
        None => Ok(()),
    }
}
