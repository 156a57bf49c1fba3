//! Per-row lifecycle and submission outcomes.

use std::fmt;

use serde::Serialize;

use crate::relationship::Relationship;

/// Identifier assigned to a relationship by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a single row through the pipeline.
///
/// `Pending → Validated → Built → Submitting → {Succeeded | Failed | Skipped}`.
/// A row can also fail straight from `Pending` (validation error) and any
/// row that has not reached a terminal state can be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Pending,
    Validated,
    Built,
    Submitting,
    Succeeded,
    Failed,
    Skipped,
}

impl RecordState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RecordState::Succeeded | RecordState::Failed | RecordState::Skipped
        )
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_advance_to(self, next: RecordState) -> bool {
        use RecordState::*;

        match (self, next) {
            (Pending, Validated) | (Validated, Built) | (Built, Submitting) => true,
            (Submitting, Succeeded) | (Submitting, Failed) => true,
            (Pending, Failed) => true,
            (from, Skipped) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// Final state of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeState {
    Succeeded,
    Failed,
    Skipped,
}

impl From<OutcomeState> for RecordState {
    fn from(state: OutcomeState) -> Self {
        match state {
            OutcomeState::Succeeded => RecordState::Succeeded,
            OutcomeState::Failed => RecordState::Failed,
            OutcomeState::Skipped => RecordState::Skipped,
        }
    }
}

/// Result of processing one input row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub row_index: usize,
    /// Absent when the row never got past validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    pub state: OutcomeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<RemoteId>,
    /// The catalog already held an identical relationship; nothing was created.
    pub skipped_duplicate: bool,
    /// Number of remote create attempts made for this row.
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl SubmissionOutcome {
    pub fn succeeded(
        row_index: usize,
        relationship: Relationship,
        remote_id: RemoteId,
        attempts: u32,
    ) -> Self {
        Self {
            row_index,
            relationship: Some(relationship),
            state: OutcomeState::Succeeded,
            remote_id: Some(remote_id),
            skipped_duplicate: false,
            attempts,
            error_detail: None,
        }
    }

    pub fn duplicate(row_index: usize, relationship: Relationship, remote_id: RemoteId) -> Self {
        Self {
            row_index,
            relationship: Some(relationship),
            state: OutcomeState::Succeeded,
            remote_id: Some(remote_id),
            skipped_duplicate: true,
            attempts: 0,
            error_detail: None,
        }
    }

    pub fn failed(
        row_index: usize,
        relationship: Option<Relationship>,
        detail: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            row_index,
            relationship,
            state: OutcomeState::Failed,
            remote_id: None,
            skipped_duplicate: false,
            attempts,
            error_detail: Some(detail.into()),
        }
    }

    pub fn skipped(
        row_index: usize,
        relationship: Option<Relationship>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            row_index,
            relationship,
            state: OutcomeState::Skipped,
            remote_id: None,
            skipped_duplicate: false,
            attempts: 0,
            error_detail: Some(reason.into()),
        }
    }
}
