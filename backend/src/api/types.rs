//! REST API request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::Company;
use crate::store::{ImportReceipt, ImportSummary};
use crate::transform::pipeline::{ProcessOutcome, RunReport};

/// Multipart upload, as collected from the form fields.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file_name: Option<String>,
    pub bytes: Option<Vec<u8>>,
    pub company: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub user: Option<String>,
}

/// Response of `POST /api/import`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ImportReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
}

impl ImportResponse {
    pub fn imported(receipt: ImportReceipt, outcome: ProcessOutcome) -> Self {
        Self {
            success: true,
            message: receipt.message(),
            receipt: Some(receipt),
            report: outcome.report,
        }
    }

    pub fn rejected(outcome: ProcessOutcome) -> Self {
        Self {
            success: false,
            message: outcome.message,
            receipt: None,
            report: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyList {
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportList {
    pub imports: Vec<ImportSummary>,
}

/// Error body shared by every endpoint.
pub fn error_response(kind: &str, message: &str) -> Value {
    json!({
        "success": false,
        "kind": kind,
        "message": message,
    })
}
