//! Order-stable collection of per-row outcomes.
//!
//! One slot is preallocated per input row. Concurrent tasks write into their
//! own row's slot, so contention does not grow with batch size, and the
//! summary is assembled in row order once every task has settled.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use lineage_shared::{BatchState, BatchSummary, RecordState, SubmissionOutcome};
use tracing::warn;

#[derive(Debug)]
struct Slot {
    state: RecordState,
    outcome: Option<SubmissionOutcome>,
}

/// Thread-safe accumulator of row outcomes, indexed by row.
#[derive(Debug)]
pub struct ResultAggregator {
    slots: Vec<Mutex<Slot>>,
}

impl ResultAggregator {
    /// Create an aggregator with every row `Pending`.
    pub fn new(total_rows: usize) -> Self {
        Self {
            slots: (0..total_rows)
                .map(|_| {
                    Mutex::new(Slot {
                        state: RecordState::Pending,
                        outcome: None,
                    })
                })
                .collect(),
        }
    }

    pub fn total_rows(&self) -> usize {
        self.slots.len()
    }

    fn slot(&self, row_index: usize) -> Option<MutexGuard<'_, Slot>> {
        self.slots
            .get(row_index)
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Move a row to a non-terminal state.
    ///
    /// Returns `false` (and leaves the row untouched) for an unknown row or an
    /// illegal transition.
    pub fn advance(&self, row_index: usize, next: RecordState) -> bool {
        let Some(mut slot) = self.slot(row_index) else {
            warn!(row_index, "Advance for unknown row");
            return false;
        };

        if next.is_terminal() || !slot.state.can_advance_to(next) {
            warn!(
                row_index,
                from = ?slot.state,
                to = ?next,
                "Rejected illegal row state transition"
            );
            return false;
        }

        slot.state = next;
        true
    }

    /// Store a row's final outcome.
    ///
    /// A row resolves exactly once: returns `false` if it already has an
    /// outcome or the transition is illegal.
    pub fn record(&self, outcome: SubmissionOutcome) -> bool {
        let row_index = outcome.row_index;
        let Some(mut slot) = self.slot(row_index) else {
            warn!(row_index, "Outcome for unknown row");
            return false;
        };

        let next = RecordState::from(outcome.state);
        if slot.outcome.is_some() || !slot.state.can_advance_to(next) {
            warn!(
                row_index,
                from = ?slot.state,
                to = ?next,
                "Rejected outcome for row"
            );
            return false;
        }

        slot.state = next;
        slot.outcome = Some(outcome);
        true
    }

    pub fn state(&self, row_index: usize) -> Option<RecordState> {
        self.slot(row_index).map(|slot| slot.state)
    }

    /// Rows that have not yet reached a terminal state.
    pub fn unresolved(&self) -> Vec<usize> {
        (0..self.slots.len())
            .filter(|&row| self.slot(row).is_some_and(|slot| slot.outcome.is_none()))
            .collect()
    }

    pub fn batch_state(&self) -> BatchState {
        if self.unresolved().is_empty() {
            BatchState::Completed
        } else {
            BatchState::Running
        }
    }

    /// Assemble the summary in row order.
    ///
    /// Any row still unresolved is marked skipped so every row appears exactly
    /// once.
    pub fn finish(
        &self,
        aborted: Option<String>,
        cancelled: bool,
        started_at: DateTime<Utc>,
    ) -> BatchSummary {
        let outcomes = self
            .slots
            .iter()
            .enumerate()
            .map(|(row_index, slot)| {
                let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
                match slot.outcome.take() {
                    Some(outcome) => outcome,
                    None => {
                        warn!(row_index, state = ?slot.state, "Row left unresolved; marking skipped");
                        slot.state = RecordState::Skipped;
                        SubmissionOutcome::skipped(row_index, None, "not processed")
                    }
                }
            })
            .collect();

        BatchSummary::from_outcomes(outcomes, aborted, cancelled, started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_shared::{OutcomeState, Relationship, RemoteId};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn rel(n: usize) -> Relationship {
        Relationship::new(format!("s{}", n), "t", "feeds", BTreeMap::new())
    }

    fn submitting(aggregator: &ResultAggregator, row: usize) {
        assert!(aggregator.advance(row, RecordState::Validated));
        assert!(aggregator.advance(row, RecordState::Built));
        assert!(aggregator.advance(row, RecordState::Submitting));
    }

    #[test]
    fn test_states_only_move_forward() {
        let aggregator = ResultAggregator::new(1);

        assert!(!aggregator.advance(0, RecordState::Built));
        submitting(&aggregator, 0);
        assert!(!aggregator.advance(0, RecordState::Validated));
        assert!(!aggregator.advance(0, RecordState::Succeeded));
        assert_eq!(aggregator.state(0), Some(RecordState::Submitting));
    }

    #[test]
    fn test_outcome_recorded_once() {
        let aggregator = ResultAggregator::new(1);
        submitting(&aggregator, 0);

        assert!(aggregator.record(SubmissionOutcome::succeeded(
            0,
            rel(0),
            RemoteId::new("r"),
            1
        )));
        assert!(!aggregator.record(SubmissionOutcome::failed(0, None, "late", 1)));
        assert_eq!(aggregator.state(0), Some(RecordState::Succeeded));
    }

    #[test]
    fn test_success_requires_submission() {
        let aggregator = ResultAggregator::new(1);
        assert!(!aggregator.record(SubmissionOutcome::succeeded(
            0,
            rel(0),
            RemoteId::new("r"),
            1
        )));
        assert!(aggregator.record(SubmissionOutcome::failed(0, None, "missing", 0)));
    }

    #[test]
    fn test_unknown_row_is_rejected() {
        let aggregator = ResultAggregator::new(1);
        assert!(!aggregator.advance(3, RecordState::Validated));
        assert!(!aggregator.record(SubmissionOutcome::skipped(3, None, "x")));
    }

    #[test]
    fn test_finish_orders_rows_and_fills_gaps() {
        let aggregator = Arc::new(ResultAggregator::new(4));

        let handles: Vec<_> = (0..3)
            .rev()
            .map(|row| {
                let aggregator = Arc::clone(&aggregator);
                std::thread::spawn(move || {
                    submitting(&aggregator, row);
                    aggregator.record(SubmissionOutcome::succeeded(
                        row,
                        rel(row),
                        RemoteId::new(format!("r{}", row)),
                        1,
                    ))
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        assert_eq!(aggregator.batch_state(), BatchState::Running);
        assert_eq!(aggregator.unresolved(), vec![3]);

        let summary = aggregator.finish(None, false, Utc::now());

        assert_eq!(
            summary.outcomes.iter().map(|o| o.row_index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert_eq!(summary.outcomes[3].state, OutcomeState::Skipped);
        assert_eq!(summary.created, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.state, BatchState::Completed);
        assert!(summary.is_consistent());
    }
}
