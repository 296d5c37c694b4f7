//! Noise row filter: drops subtotal/total lines (`T` + `TOTAL`).

use crate::api::logs::log_info;
use crate::models::LedgerTable;

/// Remove total rows. Returns the remaining table and how many were removed.
pub fn remove_noise_rows(table: LedgerTable) -> (LedgerTable, usize) {
    let before = table.len();
    let rows: Vec<_> = table.rows.into_iter().filter(|row| !row.is_noise()).collect();
    let removed = before - rows.len();

    if removed > 0 {
        log_info(format!("🗑️  Removed {} total row(s)", removed));
    }

    (LedgerTable::new(rows), removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LedgerRow;

    fn row(level: &str, description: &str) -> LedgerRow {
        LedgerRow {
            level: level.into(),
            account: "9".into(),
            description: description.into(),
            prior_balance: 0.0,
            debit: 0.0,
            credit: 0.0,
            current_balance: 0.0,
        }
    }

    #[test]
    fn test_any_case_and_whitespace_removed() {
        let table = LedgerTable::new(vec![row("t", " total "), row("1", "Caixa")]);
        let (filtered, removed) = remove_noise_rows(table);

        assert_eq!(removed, 1);
        assert_eq!(filtered.rows, vec![row("1", "Caixa")]);
    }

    #[test]
    fn test_single_marker_retained() {
        let table = LedgerTable::new(vec![row("T", "Subtotal"), row("2", "TOTAL")]);
        let (filtered, removed) = remove_noise_rows(table);

        assert_eq!(removed, 0);
        assert_eq!(filtered.len(), 2);
    }
}
