use crate::context::BatchContext;
use crate::dispatch::{Dispatcher, DispatchOutcome, Progress};
use crate::error::EngineError;
use crate::reconcile::{export_headers, reconcile, ExportRecord};
use crate::summary::{compute_summary, BatchSummary};

/// Everything a finished batch produces.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRun {
    pub outcome: DispatchOutcome,
    pub records: Vec<ExportRecord>,
    pub headers: Vec<String>,
    pub summary: BatchSummary,
}

/// Dispatch, reconcile and summarize one batch.
pub fn run(
    ctx: &BatchContext,
    dispatcher: &Dispatcher<'_>,
    output_column: &str,
    on_progress: impl FnMut(Progress),
) -> Result<BatchRun, EngineError> {
    let outcome = dispatcher.dispatch(ctx, on_progress)?;
    let records = reconcile(&ctx.rows, &outcome.results, output_column);
    let headers = export_headers(&records, output_column);
    let summary = compute_summary(&outcome);

    log::debug!(
        "batch finished: {} rows, {} succeeded, {} failed, {} chunk error(s)",
        summary.total_rows,
        summary.succeeded,
        summary.failed,
        summary.chunk_errors
    );

    Ok(BatchRun {
        outcome,
        records,
        headers,
        summary,
    })
}
