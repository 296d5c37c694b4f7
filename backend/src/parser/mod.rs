//! Loader: raw balancete bytes to a string-celled [`Table`].
//!
//! Decoding is tried with a primary encoding first; on any decode or parse
//! failure the input is rewound and read again with the fallback encoding.
//! The delimiter is fixed by configuration and never sniffed. No cell is
//! interpreted here, numeric semantics belong to later stages.

use encoding_rs::Encoding;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{DecodeFailure, LoadError, LoadResult};
use crate::models::{Row, Table};

/// Prefix given to columns whose header cell is blank.
pub const PLACEHOLDER_PREFIX: &str = "Unnamed";

/// How bytes become a table.
#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    pub delimiter: u8,
    pub primary: &'static Encoding,
    pub fallback: &'static Encoding,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b';',
            primary: encoding_rs::UTF_8,
            fallback: encoding_rs::WINDOWS_1252,
        }
    }
}

/// A loaded table and the encoding that succeeded.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub table: Table,
    pub encoding: &'static str,
}

/// Load a table from a rewindable source.
pub fn load<R: Read + Seek>(reader: &mut R, config: &LoaderConfig) -> LoadResult<Loaded> {
    let primary = match read_as(reader, config.primary, config.delimiter)? {
        Ok(table) => return Ok(loaded(table, config.primary)),
        Err(failure) => failure,
    };

    log_warning(format!(
        "Could not read as {} ({}), retrying as {}",
        config.primary.name(),
        primary,
        config.fallback.name()
    ));
    reader.seek(SeekFrom::Start(0))?;

    match read_as(reader, config.fallback, config.delimiter)? {
        Ok(table) => Ok(loaded(table, config.fallback)),
        Err(fallback) => Err(LoadError::Unreadable {
            primary_encoding: config.primary.name().to_string(),
            primary,
            fallback_encoding: config.fallback.name().to_string(),
            fallback,
        }),
    }
}

/// Load a table from an in-memory upload.
pub fn load_bytes(bytes: &[u8], config: &LoaderConfig) -> LoadResult<Loaded> {
    load(&mut Cursor::new(bytes), config)
}

/// Load a table from disk. The file is closed before this returns.
pub fn load_file<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> LoadResult<Loaded> {
    let mut file = File::open(path.as_ref())?;
    load(&mut file, config)
}

fn loaded(table: Table, encoding: &'static Encoding) -> Loaded {
    log_success(format!("Read file as {}", encoding.name()));
    log_info(format!("{} columns, {} rows", table.columns.len(), table.len()));
    Loaded {
        table,
        encoding: encoding.name(),
    }
}

/// One full attempt. IO failures abort the load; decode failures are
/// returned as the inner error so the caller can fall back.
fn read_as<R: Read>(
    reader: &mut R,
    encoding: &'static Encoding,
    delimiter: u8,
) -> LoadResult<Result<Table, DecodeFailure>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode(&bytes, encoding).and_then(|text| parse_table(&text, delimiter)))
}

/// Strictly decode bytes; malformed sequences fail instead of being replaced.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> Result<String, DecodeFailure> {
    let text = encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| DecodeFailure::Malformed(encoding.name().to_string()))?;
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Parse delimited text whose first record is the header.
///
/// Empty fields become absent cells, short rows are padded with absent
/// cells, and a row longer than the header is an error.
pub fn parse_table(content: &str, delimiter: u8) -> Result<Table, DecodeFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(csv_failure)?,
        None => return Err(DecodeFailure::NoHeaders),
    };
    let columns = header_names(&header);

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record.map_err(csv_failure)?;
        if record.len() > columns.len() {
            return Err(DecodeFailure::FieldCount {
                line: record.position().map_or(index as u64 + 2, |p| p.line()),
                expected: columns.len(),
                found: record.len(),
            });
        }

        let cells = (0..columns.len())
            .map(|i| record.get(i).filter(|v| !v.is_empty()).map(str::to_string))
            .collect();
        rows.push(Row::new(index, cells));
    }

    Ok(Table::new(columns, rows))
}

/// Trimmed header names; blank ones get a placeholder, repeats get `.n`.
fn header_names(header: &csv::StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(header.len());

    for (position, raw) in header.iter().enumerate() {
        let trimmed = raw.trim();
        let base = if trimmed.is_empty() {
            format!("{}: {}", PLACEHOLDER_PREFIX, position)
        } else {
            trimmed.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.push(name);
    }

    names
}

fn csv_failure(err: csv::Error) -> DecodeFailure {
    DecodeFailure::Csv(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(content: &str) -> Table {
        parse_table(content, b';').unwrap()
    }

    #[test]
    fn test_simple_table() {
        let table = parse("Conta;Saldo Atual\n1.01;1.050,00\n1.02;3,5");

        assert_eq!(table.columns, vec!["Conta", "Saldo Atual"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(&table.rows[0], "Saldo Atual"), Some("1.050,00"));
        assert_eq!(table.rows[1].index, 1);
    }

    #[test]
    fn test_cells_are_not_trimmed() {
        let table = parse("a;b\n  x ;y");
        assert_eq!(table.rows[0].cells[0].as_deref(), Some("  x "));
    }

    #[test]
    fn test_quoted_values() {
        let table = parse("name;value\n\"Caixa; geral\";\"10\"");
        assert_eq!(table.rows[0].cells[0].as_deref(), Some("Caixa; geral"));
        assert_eq!(table.rows[0].cells[1].as_deref(), Some("10"));
    }

    #[test]
    fn test_empty_and_missing_fields_are_absent() {
        let table = parse("a;b;c\n1;;\n2");
        assert_eq!(table.rows[0].cells, vec![Some("1".into()), None, None]);
        assert_eq!(table.rows[1].cells, vec![Some("2".into()), None, None]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let table = parse("a;b\n1;2\n\n3;4\n");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_extra_fields_rejected() {
        let err = parse_table("a;b\n1;2\n1;2;3", b';').unwrap_err();
        assert_eq!(
            err,
            DecodeFailure::FieldCount { line: 3, expected: 2, found: 3 }
        );
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let table = parse("Conta;;Conta; \n1;2;3;4");
        assert_eq!(table.columns, vec!["Conta", "Unnamed: 1", "Conta.1", "Unnamed: 3"]);
    }

    #[test]
    fn test_empty_input_has_no_headers() {
        assert_eq!(parse_table("", b';').unwrap_err(), DecodeFailure::NoHeaders);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let bytes = b"\xEF\xBB\xBFConta;Nivel\n1;2";
        let loaded = load_bytes(bytes, &LoaderConfig::default()).unwrap();
        assert_eq!(loaded.table.columns[0], "Conta");
        assert_eq!(loaded.encoding, "UTF-8");
    }

    #[test]
    fn test_latin1_fallback() {
        // "Nível;Conta" with í encoded as 0xED
        let bytes: &[u8] = b"N\xEDvel;Conta\n1;1.01";
        let loaded = load_bytes(bytes, &LoaderConfig::default()).unwrap();

        assert_eq!(loaded.encoding, "windows-1252");
        assert_eq!(loaded.table.columns, vec!["Nível", "Conta"]);
    }

    #[test]
    fn test_both_encodings_fail() {
        let err = load_bytes(b"", &LoaderConfig::default()).unwrap_err();
        match err {
            LoadError::Unreadable { primary, fallback, .. } => {
                assert_eq!(primary, DecodeFailure::NoHeaders);
                assert_eq!(fallback, DecodeFailure::NoHeaders);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_is_strict() {
        assert_eq!(
            decode(b"\xFF", encoding_rs::UTF_8).unwrap_err(),
            DecodeFailure::Malformed("UTF-8".into())
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let config = LoaderConfig { delimiter: b'\t', ..LoaderConfig::default() };
        let loaded = load_bytes(b"a\tb\n1\t2", &config).unwrap();
        assert_eq!(loaded.table.columns, vec!["a", "b"]);
    }

    #[test]
    fn test_load_file_rewinds_for_fallback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Desc. Conta\nCr\xE9dito").unwrap();

        let loaded = load_file(file.path(), &LoaderConfig::default()).unwrap();
        assert_eq!(loaded.table.cell(&loaded.table.rows[0], "Desc. Conta"), Some("Crédito"));
    }
}
