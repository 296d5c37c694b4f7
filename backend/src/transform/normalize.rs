//! Cell normalizer.
//!
//! Text columns are trimmed. Numeric columns are rewritten from Brazilian
//! formatting (`1.234,56`) into canonical decimal text (`1234.56`); parsing
//! into numbers happens in [`super::coerce`]. Rows with nothing in them are
//! dropped. Columns outside the contract are left as they are.

use crate::api::logs::log_info;
use crate::models::{Row, Table, NUMERIC_COLUMNS, TEXT_COLUMNS};

/// Canonicalize one localized amount.
///
/// The step order matters: dots must go before the comma becomes a dot,
/// otherwise the decimal point would be stripped as a thousands separator.
pub fn canonical_number(raw: Option<&str>) -> String {
    let trimmed = raw.unwrap_or("").trim();
    let without_thousands = trimmed.replace('.', "");
    let with_decimal_point = without_thousands.replace(',', ".");
    let cleaned: String = with_decimal_point
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if cleaned.is_empty() || cleaned == "nan" {
        "0".to_string()
    } else {
        cleaned
    }
}

fn trim_text(cell: Option<String>) -> Option<String> {
    cell.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn normalize_table(table: Table) -> Table {
    let text: Vec<usize> = TEXT_COLUMNS
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
    let numeric: Vec<usize> = NUMERIC_COLUMNS
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    let Table { columns, rows } = table;
    let before = rows.len();

    let rows: Vec<Row> = rows
        .into_iter()
        .filter(|row| !row.is_blank())
        .map(|mut row| {
            for &i in &text {
                if let Some(cell) = row.cells.get_mut(i) {
                    *cell = trim_text(cell.take());
                }
            }
            for &i in &numeric {
                if let Some(cell) = row.cells.get_mut(i) {
                    *cell = Some(canonical_number(cell.as_deref()));
                }
            }
            row
        })
        .collect();

    let dropped = before - rows.len();
    if dropped > 0 {
        log_info(format!("🧹 Dropped {} empty row(s)", dropped));
    }

    Table::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::REQUIRED_COLUMNS;

    #[test]
    fn test_brazilian_amounts() {
        assert_eq!(canonical_number(Some("1.234,56")), "1234.56");
        assert_eq!(canonical_number(Some("-12,5")), "-12.5");
        assert_eq!(canonical_number(Some(" 1.000.000,00 ")), "1000000.00");
        assert_eq!(canonical_number(Some("-1.234,56")), "-1234.56");
    }

    #[test]
    fn test_empty_and_nan_become_zero() {
        assert_eq!(canonical_number(Some("")), "0");
        assert_eq!(canonical_number(Some("   ")), "0");
        assert_eq!(canonical_number(Some("nan")), "0");
        assert_eq!(canonical_number(None), "0");
    }

    #[test]
    fn test_stray_characters_stripped() {
        assert_eq!(canonical_number(Some("R$ 1.050,00 D")), "1050.00");
        assert_eq!(canonical_number(Some("(300,00)")), "300.00");
    }

    #[test]
    fn test_dot_decimal_is_treated_as_thousands() {
        assert_eq!(canonical_number(Some("12.5")), "125");
    }

    #[test]
    fn test_normalize_table() {
        let table = Table::from_strs(
            &REQUIRED_COLUMNS,
            &[
                &[" 1 ", " 1.01 ", " Caixa ", "1.000,00", "50,00", "", " nan "],
                &["", "", "", "", "", "", ""],
                &["  ", "", " ", "", "", "", ""],
            ],
        );

        let normalized = normalize_table(table);
        assert_eq!(normalized.len(), 1);

        let row = &normalized.rows[0];
        assert_eq!(normalized.cell(row, "Nível"), Some("1"));
        assert_eq!(normalized.cell(row, "Conta"), Some("1.01"));
        assert_eq!(normalized.cell(row, "Desc. Conta"), Some("Caixa"));
        assert_eq!(normalized.cell(row, "Saldo Anterior"), Some("1000.00"));
        assert_eq!(normalized.cell(row, "Val. Débito"), Some("50.00"));
        assert_eq!(normalized.cell(row, "Val. Crédito"), Some("0"));
        assert_eq!(normalized.cell(row, "Saldo Atual"), Some("0"));
    }

    #[test]
    fn test_blank_text_becomes_absent_and_extras_untouched() {
        let table = Table::from_strs(&["Conta", "Obs"], &[&["   ", " keep me "]]);
        let normalized = normalize_table(table);

        assert_eq!(normalized.rows[0].cells[0], None);
        assert_eq!(normalized.rows[0].cells[1].as_deref(), Some(" keep me "));
    }

    #[test]
    fn test_row_indices_survive_dropping() {
        let table = Table::from_strs(&["Conta"], &[&[""], &["2.01"]]);
        let normalized = normalize_table(table);
        assert_eq!(normalized.rows[0].index, 1);
    }
}
