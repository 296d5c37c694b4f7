//! Per-upload session state, owned by the calling layer.
//!
//! ```text
//! Idle ──select_file──▶ FileSelected ──process──▶ Processed ──persist──▶ Persisted
//!  ▲                        │ (failure)               │
//!  └────────────────────────┘◀───────reset────────────┘
//! ```
//!
//! Selecting another file discards a processed table. A failed `process`
//! returns to `Idle`; a failed `persist` keeps the processed table so the
//! write can be retried.

use crate::error::SessionError;
use crate::models::{ImportRequest, LedgerTable};
use crate::parser::LoaderConfig;
use crate::store::{ImportReceipt, LedgerStore};
use crate::transform::pipeline::{run, ProcessOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    FileSelected {
        file_name: String,
        bytes: Vec<u8>,
    },
    Processed {
        file_name: String,
        table: LedgerTable,
        message: String,
    },
    Persisted {
        receipt: ImportReceipt,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::FileSelected { .. } => "file-selected",
            SessionState::Processed { .. } => "processed",
            SessionState::Persisted { .. } => "persisted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadSession {
    state: SessionState,
    last_message: Option<String>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            last_message: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Message of the last process or persist attempt.
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// The processed table awaiting persistence, if any.
    pub fn table(&self) -> Option<&LedgerTable> {
        match &self.state {
            SessionState::Processed { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn select_file(&mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Result<(), SessionError> {
        if let SessionState::Persisted { .. } = self.state {
            return Err(self.invalid("select a file"));
        }
        self.state = SessionState::FileSelected {
            file_name: file_name.into(),
            bytes,
        };
        self.last_message = None;
        Ok(())
    }

    /// Run the pipeline on the selected file.
    pub fn process(&mut self, config: &LoaderConfig) -> Result<ProcessOutcome, SessionError> {
        let (file_name, bytes) = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::FileSelected { file_name, bytes } => (file_name, bytes),
            other => {
                self.state = other;
                return Err(self.invalid("process"));
            }
        };

        let outcome = ProcessOutcome::from(run(&bytes, config));
        self.last_message = Some(outcome.message.clone());

        if let Some(table) = &outcome.table {
            self.state = SessionState::Processed {
                file_name,
                table: table.clone(),
                message: outcome.message.clone(),
            };
        }
        Ok(outcome)
    }

    /// Hand the processed table to `store`.
    pub fn persist<S: LedgerStore + ?Sized>(
        &mut self,
        store: &mut S,
        request: &ImportRequest,
    ) -> Result<ImportReceipt, SessionError> {
        let table = match &self.state {
            SessionState::Processed { table, .. } => table,
            _ => return Err(self.invalid("persist")),
        };

        let receipt = store.persist(request, table)?;
        self.last_message = Some(receipt.message());
        self.state = SessionState::Persisted {
            receipt: receipt.clone(),
        };
        Ok(receipt)
    }

    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.last_message = None;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.state.name(),
            action,
        }
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::models::{Actor, Period};
    use crate::store::ImportSummary;

    const GOOD: &str = "Nível;Conta;Desc. Conta;Saldo Anterior;Val. Débito;Val. Crédito;Saldo Atual\n\
                        1;1.01;Caixa;1.000,00;50,00;0,00;1.050,00";

    /// Records what it was asked to persist.
    #[derive(Default)]
    struct MemoryStore {
        persisted: Vec<(ImportRequest, LedgerTable)>,
        fail: bool,
    }

    impl LedgerStore for MemoryStore {
        fn persist(&mut self, request: &ImportRequest, table: &LedgerTable) -> StoreResult<ImportReceipt> {
            if self.fail {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.persisted.push((request.clone(), table.clone()));
            Ok(ImportReceipt {
                summary: ImportSummary {
                    id: "1".into(),
                    company: request.company.clone(),
                    period: request.period,
                    imported_by: request.actor.clone(),
                    imported_at: chrono::Utc::now(),
                    row_count: table.len(),
                },
                replaced: false,
            })
        }
    }

    fn request() -> ImportRequest {
        ImportRequest {
            company: "ACME".into(),
            period: Period::new(3, 2025).unwrap(),
            actor: Actor::new("ana@auditmc.com.br"),
        }
    }

    #[test]
    fn test_happy_path() {
        let mut session = UploadSession::new();
        let mut store = MemoryStore::default();

        session.select_file("marco.csv", GOOD.as_bytes().to_vec()).unwrap();
        assert_eq!(session.state().name(), "file-selected");

        let outcome = session.process(&LoaderConfig::default()).unwrap();
        assert!(outcome.success);
        assert_eq!(session.state().name(), "processed");
        assert_eq!(session.table().map(LedgerTable::len), Some(1));

        let receipt = session.persist(&mut store, &request()).unwrap();
        assert_eq!(receipt.summary.row_count, 1);
        assert_eq!(session.state().name(), "persisted");
        assert_eq!(store.persisted.len(), 1);
        assert_eq!(
            session.last_message(),
            Some("Imported 1 records for ACME (03/2025) by ana@auditmc.com.br")
        );
    }

    #[test]
    fn test_failed_process_returns_to_idle() {
        let mut session = UploadSession::new();
        session.select_file("bad.csv", b"Conta\n1".to_vec()).unwrap();

        let outcome = session.process(&LoaderConfig::default()).unwrap();
        assert!(!outcome.success);
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.last_message().unwrap().starts_with("Missing columns"));
    }

    #[test]
    fn test_illegal_transitions() {
        let mut session = UploadSession::new();
        let mut store = MemoryStore::default();

        assert!(matches!(
            session.process(&LoaderConfig::default()),
            Err(SessionError::InvalidTransition { from: "idle", action: "process" })
        ));
        assert!(session.persist(&mut store, &request()).is_err());

        session.select_file("a.csv", GOOD.as_bytes().to_vec()).unwrap();
        session.process(&LoaderConfig::default()).unwrap();
        session.persist(&mut store, &request()).unwrap();

        assert!(session.select_file("b.csv", Vec::new()).is_err());
        session.reset();
        assert!(session.select_file("b.csv", Vec::new()).is_ok());
    }

    #[test]
    fn test_new_file_discards_processed_table() {
        let mut session = UploadSession::new();
        session.select_file("a.csv", GOOD.as_bytes().to_vec()).unwrap();
        session.process(&LoaderConfig::default()).unwrap();

        session.select_file("b.csv", GOOD.as_bytes().to_vec()).unwrap();
        assert!(session.table().is_none());
    }

    #[test]
    fn test_failed_persist_keeps_table() {
        let mut session = UploadSession::new();
        let mut store = MemoryStore { fail: true, ..Default::default() };

        session.select_file("a.csv", GOOD.as_bytes().to_vec()).unwrap();
        session.process(&LoaderConfig::default()).unwrap();

        assert!(matches!(session.persist(&mut store, &request()), Err(SessionError::Store(_))));
        assert_eq!(session.state().name(), "processed");
    }
}
