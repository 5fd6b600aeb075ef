use std::fmt;

use crate::model::Group;
use crate::shape::ShapeKind;
use crate::validate::ValidationReport;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No rows supplied.
    EmptyDataset,
    /// Pre-flight validation failed; the report lists the missing columns.
    Validation(ValidationReport),
    /// No shape could be resolved for a group the operation needs.
    DetectionFailure { group: Group },
    /// A result slot was written twice.
    SlotAlreadyWritten { index: usize },
    /// A result slot index is past the end of the table.
    SlotOutOfRange { index: usize, len: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => write!(f, "empty dataset"),
            Self::Validation(report) => {
                write!(f, "validation failed: {}", report.errors.join("; "))
            }
            Self::DetectionFailure { group } => {
                write!(f, "could not detect a {group} shape from the columns; select one explicitly")
            }
            Self::SlotAlreadyWritten { index } => write!(f, "result slot {index} already written"),
            Self::SlotOutOfRange { index, len } => {
                write!(f, "result slot {index} out of range (table has {len} rows)")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// One entry of a validation report.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyDataset,
    /// No alias of a required field is among the columns.
    MissingColumn {
        shape: ShapeKind,
        group: Group,
        aliases: Vec<String>,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDataset => write!(f, "empty dataset"),
            Self::MissingColumn { shape, group, aliases } => {
                write!(f, "{shape} ({group}) missing column: {}", aliases.join(" | "))
            }
        }
    }
}

/// Failure of one remote batch call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connection, DNS, timeout.
    Network(String),
    /// Non-success HTTP status with response body.
    Http(u16, String),
    /// Response body was not the expected JSON.
    Parse(String),
    /// Response does not line up with the submitted chunk.
    ProtocolMismatch { expected: usize, received: usize },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Http(code, body) => write!(f, "HTTP {code}: {body}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::ProtocolMismatch { expected, received } => write!(
                f,
                "protocol mismatch: sent {expected} calculation(s), received {received} result(s)"
            ),
        }
    }
}

impl std::error::Error for TransportError {}
