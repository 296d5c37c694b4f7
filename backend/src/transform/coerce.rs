//! Type coercer: canonical text cells to [`LedgerRow`]s.
//!
//! Amounts that still do not parse become zero; a bad number never costs a
//! row. The account key is the real gate: any blank `Conta` fails the whole
//! table, listing every offending row. Total rows are exempt from the key
//! check since the noise filter discards them next.

use crate::api::logs::{log_error, log_success};
use crate::error::{PipelineResult, ValidationError};
use crate::models::{is_total_marker, LedgerRow, LedgerTable, Row, Table};
use crate::validation::ColumnLayout;

/// Parse a canonical amount; anything unparsable or non-finite is zero.
pub fn parse_number(canonical: &str) -> f64 {
    canonical
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn text(row: &Row, index: usize) -> &str {
    row.cells
        .get(index)
        .and_then(|c| c.as_deref())
        .map(str::trim)
        .unwrap_or("")
}

fn to_ledger_row(row: &Row, layout: &ColumnLayout) -> LedgerRow {
    LedgerRow {
        level: text(row, layout.level).to_string(),
        account: text(row, layout.account).to_string(),
        description: text(row, layout.description).to_string(),
        prior_balance: parse_number(text(row, layout.prior_balance)),
        debit: parse_number(text(row, layout.debit)),
        credit: parse_number(text(row, layout.credit)),
        current_balance: parse_number(text(row, layout.current_balance)),
    }
}

/// Type every row. All-or-nothing: no table is returned if any key is blank.
pub fn coerce_types(table: Table) -> PipelineResult<LedgerTable> {
    let layout = ColumnLayout::resolve(&table)?;

    let mut blank_accounts = Vec::new();
    let mut rows = Vec::with_capacity(table.len());

    for row in &table.rows {
        let ledger = to_ledger_row(row, &layout);
        if ledger.account.is_empty() && !is_total_marker(&ledger.level, &ledger.description) {
            blank_accounts.push(row.index);
        }
        rows.push(ledger);
    }

    if !blank_accounts.is_empty() {
        log_error(format!("{} row(s) without 'Conta'", blank_accounts.len()));
        return Err(ValidationError::BlankAccount { rows: blank_accounts }.into());
    }

    log_success(format!("Typed {} rows", rows.len()));
    Ok(LedgerTable::new(rows))
}
