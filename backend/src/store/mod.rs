//! Ledger store - durable home of imported balancetes.
//!
//! The pipeline hands a finished [`LedgerTable`] to a [`LedgerStore`]. The
//! bundled [`FileLedgerStore`] keeps one JSON file per (company, period);
//! importing the same period again replaces the previous import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::api::logs::{log_success, log_warning};
use crate::error::{StoreError, StoreResult};
use crate::models::{Actor, ImportRequest, LedgerRow, LedgerTable, Period};

/// Directory where imports are stored (relative to current dir)
pub const DEFAULT_DATA_DIR: &str = ".balancete/imports";

/// Persistence collaborator. One call is one atomic write from the caller's
/// point of view; no retry happens here.
pub trait LedgerStore {
    fn persist(&mut self, request: &ImportRequest, table: &LedgerTable) -> StoreResult<ImportReceipt>;
}

/// An import as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImport {
    pub id: String,
    pub company: String,
    pub period: Period,
    pub imported_by: Actor,
    pub imported_at: DateTime<Utc>,
    pub rows: Vec<LedgerRow>,
}

impl StoredImport {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            id: self.id.clone(),
            company: self.company.clone(),
            period: self.period,
            imported_by: self.imported_by.clone(),
            imported_at: self.imported_at,
            row_count: self.rows.len(),
        }
    }
}

/// Listing entry, without the rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub id: String,
    pub company: String,
    pub period: Period,
    pub imported_by: Actor,
    pub imported_at: DateTime<Utc>,
    pub row_count: usize,
}

/// What a successful persist reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReceipt {
    #[serde(flatten)]
    pub summary: ImportSummary,
    /// A previous import of the same company and period was overwritten.
    pub replaced: bool,
}

impl ImportReceipt {
    pub fn message(&self) -> String {
        format!(
            "Imported {} records for {} ({}) by {}",
            self.summary.row_count, self.summary.company, self.summary.period, self.summary.imported_by
        )
    }
}

/// Optional listing filters; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportFilter {
    pub company: Option<String>,
    pub year: Option<u16>,
    pub month: Option<u8>,
}

impl ImportFilter {
    fn matches(&self, import: &StoredImport) -> bool {
        self.company
            .as_deref()
            .map_or(true, |c| c.eq_ignore_ascii_case(&import.company))
            && self.year.map_or(true, |y| y == import.period.year)
            && self.month.map_or(true, |m| m == import.period.month)
    }
}

/// In-memory key: exact company name and period.
type ImportKey = (String, Period);

/// JSON-file store: `<dir>/<company-slug>-<name-hash>-<year>-<MM>.json`.
///
/// The hash is taken over the exact company name, so companies whose slugs
/// coincide ("A&B Ltda", "A B Ltda") never share a file.
pub struct FileLedgerStore {
    data_dir: PathBuf,
    imports: HashMap<ImportKey, StoredImport>,
}

impl FileLedgerStore {
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_DATA_DIR)
    }

    /// Open a store rooted at `dir`, loading every import already there.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut store = Self {
            data_dir: PathBuf::from(dir.as_ref()),
            imports: HashMap::new(),
        };
        store.load_all();
        store
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn load_all(&mut self) {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|content| serde_json::from_str::<StoredImport>(&content).map_err(StoreError::from));
            match parsed {
                Ok(import) => {
                    self.imports.insert(Self::key(&import.company, import.period), import);
                }
                Err(e) => log_warning(format!("Skipping {}: {}", path.display(), e)),
            }
        }
    }

    /// Imports matching `filter`, newest period first, then by company.
    pub fn list(&self, filter: &ImportFilter) -> Vec<ImportSummary> {
        let mut found: Vec<ImportSummary> = self
            .imports
            .values()
            .filter(|i| filter.matches(i))
            .map(StoredImport::summary)
            .collect();

        found.sort_by(|a, b| {
            b.period
                .year
                .cmp(&a.period.year)
                .then(b.period.month.cmp(&a.period.month))
                .then(a.company.cmp(&b.company))
        });
        found
    }

    pub fn get(&self, company: &str, period: Period) -> Option<&StoredImport> {
        self.imports.get(&Self::key(company, period))
    }

    /// Remove an import. The file goes first; the in-memory entry only
    /// disappears once the disk no longer has it.
    pub fn delete(&mut self, company: &str, period: Period) -> StoreResult<()> {
        let key = Self::key(company, period);
        if !self.imports.contains_key(&key) {
            return Err(StoreError::NotFound(format!("{} {}", company, period)));
        }
        fs::remove_file(self.path_for(company, period))?;
        self.imports.remove(&key);
        Ok(())
    }

    fn path_for(&self, company: &str, period: Period) -> PathBuf {
        self.data_dir.join(format!("{}.json", file_stem(company, period)))
    }

    fn key(company: &str, period: Period) -> ImportKey {
        (company.to_string(), period)
    }
}

impl Default for FileLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for FileLedgerStore {
    fn persist(&mut self, request: &ImportRequest, table: &LedgerTable) -> StoreResult<ImportReceipt> {
        fs::create_dir_all(&self.data_dir)?;

        let key = Self::key(&request.company, request.period);
        let path = self.path_for(&request.company, request.period);
        let stored = StoredImport {
            id: Uuid::new_v4().to_string(),
            company: request.company.clone(),
            period: request.period,
            imported_by: request.actor.clone(),
            imported_at: Utc::now(),
            rows: merge_by_account(&table.rows),
        };

        // Temp file + rename: the JSON on disk is always complete.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&stored)?)?;
        fs::rename(&tmp, &path)?;

        let summary = stored.summary();
        let replaced = self.imports.insert(key, stored).is_some();
        log_success(format!("💾 Saved {} rows to {}", summary.row_count, path.display()));

        Ok(ImportReceipt { summary, replaced })
    }
}

/// One row per account; a later duplicate overwrites the earlier one in place.
fn merge_by_account(rows: &[LedgerRow]) -> Vec<LedgerRow> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut merged: Vec<LedgerRow> = Vec::with_capacity(rows.len());

    for row in rows {
        match positions.get(row.account.as_str()) {
            Some(&i) => merged[i] = row.clone(),
            None => {
                positions.insert(&row.account, merged.len());
                merged.push(row.clone());
            }
        }
    }
    merged
}

/// `<slug>-<hash>-<year>-<MM>`, the hash being the first 8 hex digits of a
/// name-based UUID of the exact company name.
fn file_stem(company: &str, period: Period) -> String {
    let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, company.as_bytes()).simple().to_string();
    format!("{}-{}-{}-{:02}", slug(company), &id[..8], period.year, period.month)
}

/// Lowercase alphanumeric runs joined by `-`.
pub fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
