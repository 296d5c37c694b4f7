//! Balancete import pipeline.
//!
//! Runs every stage in strict order and stops at the first failure:
//!
//! ```text
//! bytes ─▶ load ─▶ sanitize_columns ─▶ validate_structure ─▶ normalize_table
//!       ─▶ coerce_types ─▶ remove_noise_rows ─▶ ensure_not_empty ─▶ LedgerTable
//! ```
//!
//! Structure is validated on the raw text, normalization happens before any
//! number is parsed, and total rows are dropped only once typed.
//!
//! # Example
//!
//! ```rust,ignore
//! use balancete::{process_balancete, LoaderConfig};
//!
//! let bytes = std::fs::read("balancete_03_2025.csv")?;
//! let outcome = process_balancete(&bytes, &LoaderConfig::default());
//! println!("{} {}", outcome.success, outcome.message);
//! ```

use serde::Serialize;
use std::path::Path;

use super::coerce::coerce_types;
use super::columns::sanitize_columns;
use super::noise::remove_noise_rows;
use super::normalize::normalize_table;
use crate::api::logs::{log_error, log_info, log_success};
use crate::error::{EmptyResultError, PipelineError, PipelineResult};
use crate::models::{LedgerTable, LedgerTotals};
use crate::parser::{load_bytes, load_file, Loaded, LoaderConfig};
use crate::validation::validate_structure;

/// Diagnostics of one successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub encoding: String,
    pub source_rows: usize,
    pub dropped_columns: Vec<String>,
    pub empty_rows_dropped: usize,
    pub noise_rows_removed: usize,
    pub accepted_rows: usize,
    pub totals: LedgerTotals,
}

/// Final table of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedBalancete {
    pub table: LedgerTable,
    pub message: String,
    pub report: RunReport,
}

/// Public result of a run: a success flag and a message, plus the table on
/// success. Nothing partial is exposed on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<LedgerTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
}

impl From<PipelineResult<ProcessedBalancete>> for ProcessOutcome {
    fn from(result: PipelineResult<ProcessedBalancete>) -> Self {
        match result {
            Ok(processed) => Self {
                success: true,
                message: processed.message,
                table: Some(processed.table),
                report: Some(processed.report),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
                table: None,
                report: None,
            },
        }
    }
}

/// Run the pipeline over uploaded bytes.
pub fn run(bytes: &[u8], config: &LoaderConfig) -> PipelineResult<ProcessedBalancete> {
    log_info("📖 Reading balancete...");
    let loaded = load_bytes(bytes, config)?;
    run_loaded(loaded)
}

/// Run the pipeline over a file on disk.
pub fn run_file<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> PipelineResult<ProcessedBalancete> {
    log_info(format!("📖 Reading {}...", path.as_ref().display()));
    let loaded = load_file(path, config)?;
    run_loaded(loaded)
}

/// Never fails: every stage error becomes `success = false` and its message.
pub fn process_balancete(bytes: &[u8], config: &LoaderConfig) -> ProcessOutcome {
    let result = run(bytes, config);
    if let Err(ref e) = result {
        log_error(e.to_string());
    }
    result.into()
}

fn run_loaded(loaded: Loaded) -> PipelineResult<ProcessedBalancete> {
    let source_rows = loaded.table.len();
    let source_columns = loaded.table.columns.clone();

    let sanitized = sanitize_columns(loaded.table);
    let dropped_columns: Vec<String> = source_columns
        .into_iter()
        .filter(|c| !sanitized.columns.contains(c))
        .collect();

    log_info("✔️  Checking columns...");
    let validated = validate_structure(sanitized)?;

    log_info("⚙️  Normalizing cells...");
    let normalized = normalize_table(validated);
    let empty_rows_dropped = source_rows - normalized.len();

    let typed = coerce_types(normalized)?;
    let (filtered, noise_rows_removed) = remove_noise_rows(typed);
    let (table, message) = ensure_not_empty(filtered)?;

    log_success(&message);
    let report = RunReport {
        encoding: loaded.encoding.to_string(),
        source_rows,
        dropped_columns,
        empty_rows_dropped,
        noise_rows_removed,
        accepted_rows: table.len(),
        totals: table.totals(),
    };

    Ok(ProcessedBalancete {
        table,
        message,
        report,
    })
}

/// Fail on an empty table, otherwise return it with the accepted-row message.
pub fn ensure_not_empty(table: LedgerTable) -> Result<(LedgerTable, String), EmptyResultError> {
    if table.is_empty() {
        return Err(EmptyResultError);
    }
    let message = format!("Processed successfully! {} records", table.len());
    Ok((table, message))
}

impl PipelineError {
    /// Short machine-readable kind, used by the HTTP API.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Load(_) => "load",
            PipelineError::Schema(_) => "schema",
            PipelineError::Validation(_) => "validation",
            PipelineError::Empty(_) => "empty",
        }
    }
}
