//! # Balancete - trial-balance import and validation
//!
//! Turns accounting *balancete* exports (`;`-separated CSV/TXT, Brazilian
//! number formatting, stray subtotal rows) into validated ledger rows ready
//! for persistence.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │  bytes   │──▶│  Loader  │──▶│ Sanitize  │──▶│ Validate  │──▶│Normalize │
//! │(UTF-8/L1)│   │ (parser) │   │ (columns) │   │ (schema)  │   │ (cells)  │
//! └──────────┘   └──────────┘   └───────────┘   └───────────┘   └────┬─────┘
//!                                                                    │
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐        │
//! │  Ledger  │◀──│  Guard   │◀──│   Noise   │◀──│  Coerce   │◀───────┘
//! │  Table   │   │ (empty)  │   │  (totals) │   │ (types)   │
//! └──────────┘   └──────────┘   └───────────┘   └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use balancete::{process_balancete, LoaderConfig};
//!
//! let bytes = std::fs::read("balancete.csv").unwrap();
//! let outcome = process_balancete(&bytes, &LoaderConfig::default());
//! if outcome.success {
//!     println!("{}", outcome.message);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - One error type per failure kind
//! - [`models`] - Tables, ledger rows, import context
//! - [`parser`] - Loader with encoding fallback
//! - [`validation`] - Required-column check
//! - [`transform`] - Normalization, typing, noise filter, pipeline
//! - [`store`] - Ledger persistence
//! - [`registry`] - Company registry
//! - [`session`] - Upload session state machine
//! - [`config`] - Environment settings
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Pipeline stages
pub mod parser;
pub mod transform;
pub mod validation;

// Collaborators
pub mod registry;
pub mod store;

// Calling layer
pub mod config;
pub mod session;

// HTTP API
pub mod api;

pub use transform::pipeline;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{
    ConfigError, DecodeFailure, EmptyResultError, LoadError, PipelineError, SchemaError,
    ServerError, SessionError, StoreError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Actor, Company, ImportRequest, LedgerRow, LedgerTable, LedgerTotals, Period, Row, Table,
    REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use parser::{decode, load, load_bytes, load_file, parse_table, Loaded, LoaderConfig};
pub use transform::{
    canonical_number, coerce_types, ensure_not_empty, normalize_table, parse_number,
    process_balancete, remove_noise_rows, run, run_file, sanitize_columns, ProcessOutcome,
    ProcessedBalancete, RunReport,
};
pub use validation::{validate_structure, ColumnLayout};

// =============================================================================
// Re-exports - Collaborators and calling layer
// =============================================================================

pub use config::Settings;
pub use registry::{CompanyRegistry, FileCompanyRegistry};
pub use session::{SessionState, UploadSession};
pub use store::{FileLedgerStore, ImportFilter, ImportReceipt, ImportSummary, LedgerStore};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
