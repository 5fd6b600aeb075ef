//! `keybatch-engine`: batch ingestion and reconciliation engine.
//!
//! Turns spreadsheet rows into geometry calculation requests, sends them in
//! chunks through a [`BatchTransport`], and merges the results back into
//! exportable rows. Pure engine crate: no file or network IO.

pub mod alias;
pub mod context;
pub mod detect;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod reconcile;
pub mod shape;
pub mod summary;
pub mod validate;

pub use alias::AliasTable;
pub use context::BatchContext;
pub use detect::detect_shape;
pub use dispatch::{
    clamp_chunk_size, BatchTransport, CancelToken, ChunkError, DispatchOutcome, Dispatcher,
    Progress, RetryPolicy,
};
pub use engine::{run, BatchRun};
pub use error::{EngineError, TransportError, ValidationError};
pub use extract::extract;
pub use model::{
    CalculationRequest, CellValue, Group, Operation, ResultRecord, ResultSlot, ResultTable, Row,
    ShapeSelection,
};
pub use reconcile::{reconcile, ExportRecord, DEFAULT_OUTPUT_COLUMN};
pub use shape::{FieldToken, ShapeKind};
pub use summary::{compute_summary, BatchSummary};
pub use validate::{validate, ValidationReport};
