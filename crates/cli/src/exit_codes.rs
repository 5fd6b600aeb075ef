//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                                   |
//! |---------|------------|-----------------------------------------------|
//! | 0       | Universal  | Success                                       |
//! | 1       | Universal  | General error (unspecified)                   |
//! | 2       | Universal  | CLI usage error (bad args)                    |
//! | 3-4     | Universal  | File read/write and parse errors              |
//! | 10-19   | batch      | Pre-flight refusal and batch outcome          |
//! | 20-29   | remote     | Geometry service connectivity                 |
//! | 30-39   | config     | Settings file problems                        |

// =============================================================================
// Universal (0-4)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown shape or operation names.
pub const EXIT_USAGE: u8 = 2;

/// Input or output file could not be read or written.
pub const EXIT_IO: u8 = 3;

/// Input file could not be parsed.
pub const EXIT_PARSE: u8 = 4;

// =============================================================================
// Batch (10-19)
// =============================================================================

/// Validation failed: empty dataset or missing columns. Nothing was sent.
pub const EXIT_VALIDATION_FAILED: u8 = 10;

/// A shape could not be auto-detected from the columns. Nothing was sent.
pub const EXIT_DETECTION_FAILED: u8 = 11;

/// Batch finished but some rows failed. Only returned with `--strict`.
pub const EXIT_BATCH_FAILURES: u8 = 12;

// =============================================================================
// Remote (20-29)
// =============================================================================

/// Service unreachable (connection refused, DNS, timeout).
pub const EXIT_REMOTE_UNREACHABLE: u8 = 20;

/// Service answered with an HTTP error or an unreadable body.
pub const EXIT_REMOTE_HTTP: u8 = 21;

// =============================================================================
// Config (30-39)
// =============================================================================

/// Settings file unreadable, malformed, or holding invalid values.
pub const EXIT_CONFIG: u8 = 30;
