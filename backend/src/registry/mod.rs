//! Company registry - the companies a balancete can be imported for.
//!
//! The pipeline never checks company identity; callers resolve the company
//! through a [`CompanyRegistry`] before persisting.

use std::fs;
use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::models::Company;

pub trait CompanyRegistry {
    /// Active companies, sorted by name.
    fn list_companies(&self) -> Vec<Company>;

    /// Find an active company by id or name (case-insensitive).
    fn find(&self, id_or_name: &str) -> Option<Company> {
        let wanted = id_or_name.trim();
        self.list_companies()
            .into_iter()
            .find(|c| c.id.eq_ignore_ascii_case(wanted) || c.name.to_lowercase() == wanted.to_lowercase())
    }

    /// Like [`find`](Self::find), but an unknown company is an error.
    fn resolve(&self, id_or_name: &str) -> StoreResult<Company> {
        self.find(id_or_name)
            .ok_or_else(|| StoreError::UnknownCompany(id_or_name.to_string()))
    }
}

/// Companies loaded from a JSON array.
///
/// ```json
/// [{ "id": "acme", "name": "ACME Comércio Ltda", "cnpj": "12.345.678/0001-90" }]
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileCompanyRegistry {
    companies: Vec<Company>,
}

impl FileCompanyRegistry {
    pub fn new(companies: Vec<Company>) -> Self {
        Self { companies }
    }

    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let companies: Vec<Company> = serde_json::from_str(&content)?;
        Ok(Self::new(companies))
    }
}

impl CompanyRegistry for FileCompanyRegistry {
    fn list_companies(&self) -> Vec<Company> {
        let mut active: Vec<Company> = self.companies.iter().filter(|c| c.active).cloned().collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        active
    }
}
