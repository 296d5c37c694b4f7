//! Domain models for the balancete import pipeline.
//!
//! - [`Table`] / [`Row`] - string-celled table passed between stages
//! - [`LedgerRow`] / [`LedgerTable`] - typed end state handed to persistence
//! - [`Period`], [`Actor`], [`Company`], [`ImportRequest`] - collaborator inputs
//!
//! Column names of the schema contract are the exact headers found in
//! balancete exports.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StoreError;

// =============================================================================
// Schema Contract
// =============================================================================

pub const LEVEL: &str = "Nível";
pub const ACCOUNT: &str = "Conta";
pub const DESCRIPTION: &str = "Desc. Conta";
pub const PRIOR_BALANCE: &str = "Saldo Anterior";
pub const DEBIT: &str = "Val. Débito";
pub const CREDIT: &str = "Val. Crédito";
pub const CURRENT_BALANCE: &str = "Saldo Atual";

/// Every column a balancete must carry, in contract order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    LEVEL,
    ACCOUNT,
    DESCRIPTION,
    PRIOR_BALANCE,
    DEBIT,
    CREDIT,
    CURRENT_BALANCE,
];

/// Free-text columns.
pub const TEXT_COLUMNS: [&str; 3] = [LEVEL, ACCOUNT, DESCRIPTION];

/// Columns holding localized amounts.
pub const NUMERIC_COLUMNS: [&str; 4] = [PRIOR_BALANCE, DEBIT, CREDIT, CURRENT_BALANCE];

/// True for subtotal/total artifacts: level `T` and description `TOTAL`,
/// both compared trimmed and case-insensitively.
pub fn is_total_marker(level: &str, description: &str) -> bool {
    level.trim().to_uppercase() == "T" && description.trim().to_uppercase() == "TOTAL"
}

// =============================================================================
// Raw Table
// =============================================================================

/// One data row. `index` is the 0-based position among the file's data rows
/// and survives every stage, so errors can point back at the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: usize,
    /// One cell per table column; `None` is an absent or empty field.
    pub cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(index: usize, cells: Vec<Option<String>>) -> Self {
        Self { index, cells }
    }

    /// True when no cell holds anything but whitespace.
    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.as_deref().map_or(true, |v| v.trim().is_empty()))
    }
}

/// Ordered columns plus ordered rows of string cells.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Build a table from string literals, mostly for tests and fixtures.
    /// Empty strings become absent cells, as the loader produces them.
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                Row::new(
                    i,
                    cells
                        .iter()
                        .map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
                        .collect(),
                )
            })
            .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell of `row` under column `name`, if both exist.
    pub fn cell<'a>(&self, row: &'a Row, name: &str) -> Option<&'a str> {
        self.column_index(name)
            .and_then(|i| row.cells.get(i))
            .and_then(|c| c.as_deref())
    }
}

// =============================================================================
// Ledger Rows
// =============================================================================

/// One validated trial-balance line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub level: String,
    pub account: String,
    pub description: String,
    pub prior_balance: f64,
    pub debit: f64,
    pub credit: f64,
    pub current_balance: f64,
}

impl LedgerRow {
    /// Subtotal/total line that must not be persisted.
    pub fn is_noise(&self) -> bool {
        is_total_marker(&self.level, &self.description)
    }
}

/// Column sums of a ledger table, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LedgerTotals {
    pub prior_balance: f64,
    pub debit: f64,
    pub credit: f64,
    pub current_balance: f64,
}

/// Final output of the pipeline: ordered ledger rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerTable {
    pub rows: Vec<LedgerRow>,
}

impl LedgerTable {
    pub fn new(rows: Vec<LedgerRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn totals(&self) -> LedgerTotals {
        self.rows.iter().fold(LedgerTotals::default(), |mut acc, row| {
            acc.prior_balance += row.prior_balance;
            acc.debit += row.debit;
            acc.credit += row.credit;
            acc.current_balance += row.current_balance;
            acc
        })
    }
}

// =============================================================================
// Import Context
// =============================================================================

/// Reference month of a balancete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    pub month: u8,
    pub year: u16,
}

impl Period {
    pub fn new(month: u8, year: u16) -> Result<Self, StoreError> {
        if !(1..=12).contains(&month) {
            return Err(StoreError::InvalidPeriod(format!("month {} out of range 1-12", month)));
        }
        if !(1900..=9999).contains(&year) {
            return Err(StoreError::InvalidPeriod(format!("year {} out of range", year)));
        }
        Ok(Self { month, year })
    }
}

/// Unchecked wire form; deserialization goes through [`Period::new`].
#[derive(Deserialize)]
struct RawPeriod {
    month: u8,
    year: u16,
}

impl TryFrom<RawPeriod> for Period {
    type Error = StoreError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Period::new(raw.month, raw.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Identity of the user performing an import. Opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(pub String);

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered company ("empresa").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Everything the persistence collaborator needs besides the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub company: String,
    pub period: Period,
    pub actor: Actor,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: &str, description: &str) -> LedgerRow {
        LedgerRow {
            level: level.into(),
            account: "1.01".into(),
            description: description.into(),
            prior_balance: 1.0,
            debit: 2.0,
            credit: 3.0,
            current_balance: 4.0,
        }
    }

    #[test]
    fn test_total_marker_needs_both_tags() {
        assert!(is_total_marker("t", " total "));
        assert!(is_total_marker(" T", "Total"));
        assert!(!is_total_marker("T", "Subtotal"));
        assert!(!is_total_marker("1", "TOTAL"));
    }

    #[test]
    fn test_ledger_row_noise() {
        assert!(row("T", "TOTAL").is_noise());
        assert!(!row("T", "Caixa").is_noise());
    }

    #[test]
    fn test_row_is_blank() {
        assert!(Row::new(0, vec![None, Some("  ".into())]).is_blank());
        assert!(!Row::new(0, vec![None, Some("x".into())]).is_blank());
    }

    #[test]
    fn test_table_cell_lookup() {
        let table = Table::from_strs(&["a", "b"], &[&["1", ""]]);
        let first = &table.rows[0];
        assert_eq!(table.cell(first, "a"), Some("1"));
        assert_eq!(table.cell(first, "b"), None);
        assert_eq!(table.cell(first, "c"), None);
    }

    #[test]
    fn test_totals() {
        let table = LedgerTable::new(vec![row("1", "A"), row("2", "B")]);
        let totals = table.totals();
        assert_eq!(totals.debit, 4.0);
        assert_eq!(totals.current_balance, 8.0);
    }

    #[test]
    fn test_period_bounds_and_display() {
        assert_eq!(Period::new(3, 2025).unwrap().to_string(), "03/2025");
        assert!(Period::new(0, 2025).is_err());
        assert!(Period::new(13, 2025).is_err());
        assert!(Period::new(1, 1800).is_err());
    }

    #[test]
    fn test_period_deserialization_is_checked() {
        let period: Period = serde_json::from_str(r#"{"month":3,"year":2025}"#).unwrap();
        assert_eq!(period, Period::new(3, 2025).unwrap());

        assert!(serde_json::from_str::<Period>(r#"{"month":13,"year":2025}"#).is_err());
        assert!(serde_json::from_str::<Period>(r#"{"month":1,"year":10}"#).is_err());
    }

    #[test]
    fn test_ledger_table_serializes_as_array() {
        let table = LedgerTable::new(vec![row("1", "Caixa")]);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["account"], "1.01");
        assert_eq!(json[0]["prior_balance"], 1.0);
    }
}
