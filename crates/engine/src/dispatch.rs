//! Chunked dispatch to the computation service.
//!
//! Rows are sent in contiguous chunks, one chunk in flight at a time. A chunk
//! that keeps failing is marked failed row by row and the batch moves on;
//! a failure never leaks into another chunk's rows.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::alias::AliasTable;
use crate::context::BatchContext;
use crate::error::{EngineError, TransportError};
use crate::extract::extract;
use crate::model::{CalculationRequest, Group, Operation, ResultRecord, ResultSlot, ResultTable, Row};
use crate::shape::ShapeKind;

pub const MIN_CHUNK_SIZE: usize = 10;
pub const MAX_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Clamp a requested chunk size into `[MIN_CHUNK_SIZE, MAX_CHUNK_SIZE]`.
pub fn clamp_chunk_size(requested: usize) -> usize {
    requested.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
}

/// One batched remote call.
///
/// Implementations return one entry per request, in request order; `None`
/// marks a row the service could not compute. A response of the wrong
/// length is treated as a failed attempt.
pub trait BatchTransport {
    fn send_batch(
        &self,
        requests: &[CalculationRequest],
    ) -> Result<Vec<Option<ResultRecord>>, TransportError>;
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per chunk, first try included. Never less than 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, no sleeping between attempts.
    pub fn no_backoff() -> Self {
        Self {
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Wait before attempt `failed_attempt + 1`, doubling from the initial
    /// backoff and capped at the maximum.
    pub fn backoff_for(&self, failed_attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(failed_attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

// ---------------------------------------------------------------------------
// Cancellation and progress
// ---------------------------------------------------------------------------

/// Shared flag checked before each chunk is sent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed_rows: usize,
    pub total_rows: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total_rows == 0 {
            return 100.0;
        }
        self.processed_rows as f64 * 100.0 / self.total_rows as f64
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A chunk whose every attempt failed. `end_row` is exclusive.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChunkError {
    pub chunk_index: usize,
    pub start_row: usize,
    pub end_row: usize,
    pub attempts: u32,
    pub message: String,
    /// Failure of the last attempt; `message` is its rendered form.
    #[serde(skip)]
    pub last_error: TransportError,
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk {}-{} failed after {} attempt(s): {}",
            self.start_row, self.end_row, self.attempts, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub results: ResultTable,
    pub chunk_errors: Vec<ChunkError>,
    /// Stopped at a chunk boundary; later rows are still pending.
    pub cancelled: bool,
    /// Chunk size actually used, after clamping.
    pub chunk_size: usize,
    pub primary: ShapeKind,
    pub secondary: Option<ShapeKind>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<'a> {
    transport: &'a dyn BatchTransport,
    aliases: &'a AliasTable,
    chunk_size: usize,
    retry: RetryPolicy,
    calculator_version: Option<String>,
    cancel: CancelToken,
}

impl<'a> Dispatcher<'a> {
    pub fn new(transport: &'a dyn BatchTransport) -> Self {
        Self {
            transport,
            aliases: AliasTable::builtin(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            calculator_version: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn aliases(mut self, aliases: &'a AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    /// Requested chunk size; clamped when dispatching.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn calculator_version(mut self, version: Option<String>) -> Self {
        self.calculator_version = version;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Send every row of `ctx` and collect one result slot per row.
    ///
    /// Refuses (nothing is sent) when validation fails or a needed shape
    /// cannot be resolved. Transport failures never surface as `Err`; they
    /// end up in `chunk_errors` and as failed slots.
    pub fn dispatch(
        &self,
        ctx: &BatchContext,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<DispatchOutcome, EngineError> {
        let (primary, secondary) = ctx.resolve_shapes(self.aliases)?;
        let chunk_size = clamp_chunk_size(self.chunk_size);
        let total_rows = ctx.rows.len();

        let mut results = ResultTable::new(total_rows);
        let mut chunk_errors = Vec::new();
        let mut cancelled = false;

        for (chunk_index, chunk) in ctx.rows.chunks(chunk_size).enumerate() {
            if self.cancel.is_cancelled() {
                log::debug!("batch cancelled before chunk {chunk_index}");
                cancelled = true;
                break;
            }

            let start_row = chunk_index * chunk_size;
            let end_row = start_row + chunk.len();
            let requests: Vec<CalculationRequest> = chunk
                .iter()
                .map(|row| {
                    build_request(
                        row,
                        &ctx.operation,
                        primary,
                        secondary,
                        self.aliases,
                        self.calculator_version.as_deref(),
                    )
                })
                .collect();

            log::debug!("chunk {chunk_index}: sending rows {start_row}-{end_row}");
            match self.send_with_retry(&requests, chunk_index) {
                Ok(records) => {
                    for (offset, record) in records.into_iter().enumerate() {
                        let slot = match record {
                            Some(record) => ResultSlot::Computed(record),
                            None => ResultSlot::Failed,
                        };
                        results.write(start_row + offset, slot)?;
                    }
                    log::debug!("chunk {chunk_index}: done");
                }
                Err((attempts, err)) => {
                    let chunk_error = ChunkError {
                        chunk_index,
                        start_row,
                        end_row,
                        attempts,
                        message: err.to_string(),
                        last_error: err,
                    };
                    log::error!("{chunk_error}");
                    for index in start_row..end_row {
                        results.write(index, ResultSlot::Failed)?;
                    }
                    chunk_errors.push(chunk_error);
                }
            }

            on_progress(Progress {
                processed_rows: end_row,
                total_rows,
            });
        }

        Ok(DispatchOutcome {
            results,
            chunk_errors,
            cancelled,
            chunk_size,
            primary,
            secondary,
        })
    }

    fn send_with_retry(
        &self,
        requests: &[CalculationRequest],
        chunk_index: usize,
    ) -> Result<Vec<Option<ResultRecord>>, (u32, TransportError)> {
        let attempts = self.retry.attempts();
        let mut attempt = 1;
        loop {
            let err = match self.transport.send_batch(requests) {
                Ok(records) if records.len() == requests.len() => return Ok(records),
                Ok(records) => TransportError::ProtocolMismatch {
                    expected: requests.len(),
                    received: records.len(),
                },
                Err(err) => err,
            };

            if attempt >= attempts {
                return Err((attempt, err));
            }

            let wait = self.retry.backoff_for(attempt);
            log::warn!(
                "chunk {chunk_index}: attempt {attempt}/{attempts} failed ({err}); retrying in {}ms",
                wait.as_millis()
            );
            if !wait.is_zero() {
                thread::sleep(wait);
            }
            attempt += 1;
        }
    }
}

/// Build the request for one row.
///
/// No secondary shape or data is sent when `secondary` is `None`.
pub fn build_request(
    row: &Row,
    operation: &Operation,
    primary: ShapeKind,
    secondary: Option<ShapeKind>,
    aliases: &AliasTable,
    version: Option<&str>,
) -> CalculationRequest {
    CalculationRequest {
        operation: operation.clone(),
        shape_primary: primary,
        data_primary: extract(row, primary, Group::Primary, aliases),
        shape_secondary: secondary,
        data_secondary: secondary.map(|kind| extract(row, kind, Group::Secondary, aliases)),
        version: version.map(str::to_string),
    }
}
