//! Geometry service client, the network side of a batch.
//!
//! Blocking reqwest client (no Tokio runtime required). Implements the
//! engine's `BatchTransport`; retries and chunking stay in the engine.

mod client;

pub use client::{BatchResponse, ClientError, ErrorDetail, GeometryClient, DEFAULT_TIMEOUT};
