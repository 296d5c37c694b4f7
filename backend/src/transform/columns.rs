//! Column sanitizer: drops placeholder columns left by malformed headers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::logs::log_info;
use crate::models::{Row, Table};

/// Header names the loader invents for blank header cells.
static PLACEHOLDER_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Unnamed").expect("placeholder pattern is valid"));

pub fn is_placeholder_column(name: &str) -> bool {
    PLACEHOLDER_COLUMN.is_match(name)
}

/// Remove every placeholder column, keeping the order of the rest.
pub fn sanitize_columns(table: Table) -> Table {
    let keep: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_placeholder_column(name))
        .map(|(i, _)| i)
        .collect();

    if keep.len() == table.columns.len() {
        return table;
    }

    let dropped: Vec<&str> = table
        .columns
        .iter()
        .filter(|name| is_placeholder_column(name))
        .map(String::as_str)
        .collect();
    log_info(format!("🧹 Dropping {} unnamed column(s): {}", dropped.len(), dropped.join(", ")));

    let columns = keep.iter().map(|&i| table.columns[i].clone()).collect();
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            let cells = keep
                .iter()
                .map(|&i| row.cells.get(i).cloned().flatten())
                .collect();
            Row::new(row.index, cells)
        })
        .collect();

    Table::new(columns, rows)
}
