use serde::Serialize;

use crate::dispatch::DispatchOutcome;

/// User-facing totals for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    /// Rows with a non-empty keylog.
    pub succeeded: usize,
    /// Dispatched rows without one.
    pub failed: usize,
    /// Rows never dispatched because the batch was cancelled.
    pub skipped: usize,
    pub chunk_errors: usize,
    pub cancelled: bool,
    pub chunk_error_messages: Vec<String>,
}

impl BatchSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.chunk_errors == 0
    }
}

/// Compute summary statistics from a dispatch outcome.
pub fn compute_summary(outcome: &DispatchOutcome) -> BatchSummary {
    let total_rows = outcome.results.len();
    let succeeded = outcome.results.succeeded();
    let skipped = outcome.results.pending();

    BatchSummary {
        total_rows,
        succeeded,
        failed: total_rows - succeeded - skipped,
        skipped,
        chunk_errors: outcome.chunk_errors.len(),
        cancelled: outcome.cancelled,
        chunk_error_messages: outcome.chunk_errors.iter().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ChunkError;
    use crate::error::TransportError;
    use crate::model::{ResultRecord, ResultSlot, ResultTable};
    use crate::shape::ShapeKind;

    #[test]
    fn summary_counts() {
        let mut results = ResultTable::new(5);
        results
            .write(0, ResultSlot::Computed(ResultRecord::with_keylog("a")))
            .unwrap();
        // computed but empty keylog counts as failed
        results
            .write(1, ResultSlot::Computed(ResultRecord::default()))
            .unwrap();
        results.write(2, ResultSlot::Failed).unwrap();
        results
            .write(3, ResultSlot::Computed(ResultRecord::with_keylog("d")))
            .unwrap();

        let outcome = DispatchOutcome {
            results,
            chunk_errors: vec![ChunkError {
                chunk_index: 0,
                start_row: 0,
                end_row: 10,
                attempts: 3,
                message: "HTTP 500: boom".into(),
                last_error: TransportError::Http(500, "boom".into()),
            }],
            cancelled: true,
            chunk_size: 10,
            primary: ShapeKind::Point,
            secondary: None,
        };
        let summary = compute_summary(&outcome);
        assert_eq!(summary.total_rows, 5);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.chunk_errors, 1);
        assert!(summary.cancelled);
        assert!(!summary.is_clean());
        assert_eq!(
            summary.chunk_error_messages,
            vec!["chunk 0-10 failed after 3 attempt(s): HTTP 500: boom".to_string()]
        );
    }
}
