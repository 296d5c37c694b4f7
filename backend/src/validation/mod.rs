//! Structural validation against the balancete schema contract.
//!
//! This is the only place the seven required columns are enforced. Column
//! order and extra columns are irrelevant; extras pass through untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use balancete::{validate_structure, Table};
//!
//! let table = Table::from_strs(&["Conta"], &[]);
//! let err = validate_structure(table).unwrap_err();
//! assert_eq!(err.missing.len(), 6);
//! ```

use crate::error::SchemaError;
use crate::models::{
    Table, ACCOUNT, CREDIT, CURRENT_BALANCE, DEBIT, DESCRIPTION, LEVEL, PRIOR_BALANCE,
    REQUIRED_COLUMNS,
};

/// Required columns absent from `columns`, in contract order.
pub fn missing_columns(columns: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|required| required.to_string())
        .collect()
}

/// Check that every required column is present. Returns the table unchanged.
pub fn validate_structure(table: Table) -> Result<Table, SchemaError> {
    let missing = missing_columns(&table.columns);
    if missing.is_empty() {
        Ok(table)
    } else {
        Err(SchemaError { missing })
    }
}

/// Positions of the contract columns within one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub level: usize,
    pub account: usize,
    pub description: usize,
    pub prior_balance: usize,
    pub debit: usize,
    pub credit: usize,
    pub current_balance: usize,
}

impl ColumnLayout {
    pub fn resolve(table: &Table) -> Result<Self, SchemaError> {
        let find = |name: &str| table.column_index(name);
        match (
            find(LEVEL),
            find(ACCOUNT),
            find(DESCRIPTION),
            find(PRIOR_BALANCE),
            find(DEBIT),
            find(CREDIT),
            find(CURRENT_BALANCE),
        ) {
            (
                Some(level),
                Some(account),
                Some(description),
                Some(prior_balance),
                Some(debit),
                Some(credit),
                Some(current_balance),
            ) => Ok(Self {
                level,
                account,
                description,
                prior_balance,
                debit,
                credit,
                current_balance,
            }),
            _ => Err(SchemaError {
                missing: missing_columns(&table.columns),
            }),
        }
    }
}
