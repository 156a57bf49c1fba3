//! Order-stable batch report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::outcome::{OutcomeState, SubmissionOutcome};

/// One failed row in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_index: usize,
    pub message: String,
}

/// Batch lifecycle. A batch that got past schema resolution always ends
/// `Completed`, even when it was aborted or cancelled part way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Running,
    Completed,
}

/// Structured report of a pipeline run, ordered by row index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_rows: usize,
    pub created: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Rows counted in `created` because the catalog already held them.
    pub duplicates: usize,
    pub errors: Vec<RowError>,
    pub outcomes: Vec<SubmissionOutcome>,
    pub state: BatchState,
    /// Set when a fatal client error stopped the batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchSummary {
    /// Fold outcomes into a summary.
    ///
    /// `outcomes` must hold exactly one entry per row, sorted by row index.
    pub fn from_outcomes(
        outcomes: Vec<SubmissionOutcome>,
        aborted: Option<String>,
        cancelled: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut created = 0;
        let mut failed = 0;
        let mut skipped = 0;
        let mut duplicates = 0;
        let mut errors = Vec::new();

        for outcome in &outcomes {
            match outcome.state {
                OutcomeState::Succeeded => {
                    created += 1;
                    if outcome.skipped_duplicate {
                        duplicates += 1;
                    }
                }
                OutcomeState::Failed => {
                    failed += 1;
                    errors.push(RowError {
                        row_index: outcome.row_index,
                        message: outcome
                            .error_detail
                            .clone()
                            .unwrap_or_else(|| "unknown error".to_string()),
                    });
                }
                OutcomeState::Skipped => skipped += 1,
            }
        }

        Self {
            total_rows: outcomes.len(),
            created,
            failed,
            skipped,
            duplicates,
            errors,
            outcomes,
            state: BatchState::Completed,
            aborted,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// `created + failed + skipped == total_rows`.
    pub fn is_consistent(&self) -> bool {
        self.created + self.failed + self.skipped == self.total_rows
    }

    /// Every row was created and nothing stopped the batch early.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.aborted.is_none() && !self.cancelled
    }

    pub fn outcome(&self, row_index: usize) -> Option<&SubmissionOutcome> {
        self.outcomes.get(row_index).filter(|o| o.row_index == row_index)
    }
}
