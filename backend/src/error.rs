//! Error types for the balancete import pipeline.
//!
//! One error type per failure kind, each fatal to the run that raised it:
//!
//! - [`LoadError`] - file bytes unreadable under both encodings
//! - [`SchemaError`] - required columns absent
//! - [`ValidationError`] - blank account keys after typing
//! - [`EmptyResultError`] - nothing survived the pipeline
//! - [`PipelineError`] - top-level wrapper returned by [`crate::pipeline::run`]
//!
//! Collaborator and surface errors ([`StoreError`], [`SessionError`],
//! [`ConfigError`], [`ServerError`]) live here too so `?` works across
//! boundaries.

use thiserror::Error;

// =============================================================================
// Loader Errors
// =============================================================================

/// Why a single decode-and-parse attempt failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeFailure {
    /// Bytes are not valid in the attempted encoding.
    #[error("invalid {0} byte sequence")]
    Malformed(String),

    /// Nothing to read a header from.
    #[error("no columns to parse from file")]
    NoHeaders,

    /// A data line carries more fields than the header declares.
    #[error("line {line}: expected {expected} fields, saw {found}")]
    FieldCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Malformed delimited text.
    #[error("{0}")]
    Csv(String),
}

/// The file could not be turned into a table.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading or rewinding the input stream failed.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Both the primary and the fallback encoding failed.
    #[error("Failed to read file: {primary} (as {primary_encoding}); {fallback} (as {fallback_encoding})")]
    Unreadable {
        primary_encoding: String,
        primary: DecodeFailure,
        fallback_encoding: String,
        fallback: DecodeFailure,
    },
}

// =============================================================================
// Structural / Validation Errors
// =============================================================================

/// Required columns are absent. Lists every missing column, in contract order.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Missing columns: {}", .missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

/// Row-level violations found after type coercion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The account key is blank; `rows` holds every offending data-row index.
    #[error("Field 'Conta' is empty in rows: {rows:?}")]
    BlankAccount { rows: Vec<usize> },
}

/// Zero rows survived the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("File has no valid data rows")]
pub struct EmptyResultError;

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline error. Displays the wrapped stage error verbatim.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Empty(#[from] EmptyResultError),
}

// =============================================================================
// Collaborator Errors
// =============================================================================

/// Errors from the ledger store and company registry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown company: {0}")]
    UnknownCompany(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Import not found: {0}")]
    NotFound(String),
}

/// Illegal move in the upload session state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot {action} while session is {from}")]
    InvalidTransition { from: &'static str, action: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Invalid environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown encoding label for {var}: {label}")]
    UnknownEncoding { var: &'static str, label: String },

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type LoadResult<T> = Result<T, LoadError>;

pub type PipelineResult<T> = Result<T, PipelineError>;

pub type StoreResult<T> = Result<T, StoreError>;

pub type ServerResult<T> = Result<T, ServerError>;
