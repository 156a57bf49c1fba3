//! # Lineage Shared
//!
//! Value types that flow between the stages of the relationship ingester.
//!
//! Every type here is created once per pipeline run and never mutated after
//! construction: raw rows become validated records, validated records become
//! relationships, relationships become submission outcomes, and outcomes are
//! folded into a [`BatchSummary`].

mod outcome;
mod record;
mod relationship;
mod summary;
mod value;

pub use outcome::{OutcomeState, RecordState, RemoteId, SubmissionOutcome};
pub use record::{RawRecord, ValidatedRecord};
pub use relationship::{identity_hash, Relationship};
pub use summary::{BatchState, BatchSummary, RowError};
pub use value::{canonical_json, TypedValue};
