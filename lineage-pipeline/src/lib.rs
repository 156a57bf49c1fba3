//! # Lineage Pipeline
//!
//! This crate provides the batch relationship-ingestion engine: it turns
//! tabular rows describing data-flow edges into catalog relationships.
//!
//! ## Architecture
//!
//! Data flows strictly forward through the stages:
//!
//! 1. **Source**: Reads CSV or JSON input into raw records
//! 2. **Validator**: Checks each record against its template
//! 3. **Builder**: Converts validated records into relationships
//! 4. **Submitter**: Sends relationships to the catalog under a concurrency bound
//! 5. **Aggregator**: Collects per-row outcomes into an ordered summary
//! 6. **Orchestrator**: Composes the stages into one run

pub mod aggregator;
pub mod builder;
pub mod cancel;
pub mod errors;
pub mod orchestrator;
pub mod source;
pub mod submitter;
pub mod template;
pub mod validator;

pub use aggregator::ResultAggregator;
pub use builder::RelationshipBuilder;
pub use cancel::CancellationSignal;
pub use errors::{PipelineError, SchemaError, ValidationError};
pub use orchestrator::IngestionPipeline;
pub use source::{load_records, SourceFormat};
pub use submitter::{BatchSubmitter, RetryPolicy, SubmitReport, SubmitterConfig};
pub use template::{FieldKind, Template, TemplateKind, TemplateRegistry};
pub use validator::RecordValidator;
