//! HTTP server for balancete imports.
//!
//! # API Endpoints
//!
//! | Method | Path             | Description                                  |
//! |--------|------------------|----------------------------------------------|
//! | GET    | `/health`        | Health check                                 |
//! | POST   | `/api/process`   | Validate an upload, return the ledger table  |
//! | POST   | `/api/import`    | Validate and persist for company and period  |
//! | GET    | `/api/imports`   | List imports (`?company=&year=&month=`)      |
//! | GET    | `/api/companies` | Companies available for import               |
//! | GET    | `/api/logs`      | SSE stream of pipeline logs                  |

use axum::{
    extract::{Multipart, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, CompanyList, ImportList, ImportResponse, UploadForm};
use crate::config::Settings;
use crate::error::{ServerError, ServerResult, SessionError, StoreError};
use crate::models::{Actor, ImportRequest, Period};
use crate::registry::{CompanyRegistry, FileCompanyRegistry};
use crate::session::UploadSession;
use crate::store::{FileLedgerStore, ImportFilter};
use crate::transform::pipeline::{process_balancete, ProcessOutcome};

type ApiError = (StatusCode, Json<Value>);

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<Mutex<FileLedgerStore>>,
    pub registry: Option<Arc<FileCompanyRegistry>>,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> ServerResult<Self> {
        let registry = match &settings.companies_file {
            Some(path) => Some(Arc::new(FileCompanyRegistry::from_file(path)?)),
            None => None,
        };
        let store = FileLedgerStore::with_dir(&settings.data_dir);
        Ok(Self {
            settings: Arc::new(settings),
            store: Arc::new(Mutex::new(store)),
            registry,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/process", post(process_upload))
        .route("/api/import", post(import_upload))
        .route("/api/imports", get(list_imports))
        .route("/api/companies", get(list_companies))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let port = settings.port;
    let state = AppState::from_settings(settings)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Balancete server running on http://localhost:{}", port);
    println!("   POST /api/process   - Validate a balancete");
    println!("   POST /api/import    - Validate and store a balancete");
    println!("   GET  /api/imports   - List stored imports");
    println!("   GET  /api/companies - List companies");
    println!("   GET  /api/logs      - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "balancete",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn process_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProcessOutcome>), ApiError> {
    let form = read_form(multipart).await?;
    let bytes = form.bytes.ok_or_else(|| bad_request("No file provided"))?;
    log_info(format!(
        "📄 New upload: {} ({} bytes)",
        form.file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let outcome = process_balancete(&bytes, &state.settings.loader);
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(outcome)))
}

async fn import_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let form = read_form(multipart).await?;
    let request = import_request(&state, &form).map_err(api_error)?;
    let bytes = form.bytes.ok_or_else(|| bad_request("No file provided"))?;
    let file_name = form.file_name.unwrap_or_else(|| "upload".to_string());

    log_info(format!(
        "📄 Import: {} for {} ({}) by {}",
        file_name, request.company, request.period, request.actor
    ));

    let mut session = UploadSession::new();
    session
        .select_file(file_name, bytes)
        .map_err(|e| api_error(ServerError::Internal(e.to_string())))?;
    let outcome = session
        .process(&state.settings.loader)
        .map_err(|e| api_error(ServerError::Internal(e.to_string())))?;

    if !outcome.success {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(ImportResponse::rejected(outcome))));
    }

    let mut store = state.store.lock().await;
    let receipt = session.persist(&mut *store, &request).map_err(|e| match e {
        SessionError::Store(store_err) => api_error(store_err.into()),
        other => api_error(ServerError::Internal(other.to_string())),
    })?;

    Ok((StatusCode::OK, Json(ImportResponse::imported(receipt, outcome))))
}

async fn list_imports(
    State(state): State<AppState>,
    Query(filter): Query<ImportFilter>,
) -> Json<ImportList> {
    let store = state.store.lock().await;
    Json(ImportList {
        imports: store.list(&filter),
    })
}

async fn list_companies(State(state): State<AppState>) -> Json<CompanyList> {
    let companies = state
        .registry
        .as_ref()
        .map(|r| r.list_companies())
        .unwrap_or_default();
    Json(CompanyList { companies })
}

/// Company, period and user of an import form, checked against the registry
/// when one is configured.
fn import_request(state: &AppState, form: &UploadForm) -> ServerResult<ImportRequest> {
    let required = |value: &Option<String>, name: &str| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ServerError::BadRequest(format!("Missing field: {}", name)))
    };

    let company = required(&form.company, "company")?;
    let company = match &state.registry {
        Some(registry) => registry.resolve(&company)?.name,
        None => company,
    };

    let month: u8 = required(&form.month, "month")?
        .parse()
        .map_err(|_| ServerError::BadRequest("month must be a number".into()))?;
    let year: u16 = required(&form.year, "year")?
        .parse()
        .map_err(|_| ServerError::BadRequest("year must be a number".into()))?;
    let period = Period::new(month, year)?;
    let actor = Actor::new(required(&form.user, "user")?);

    Ok(ImportRequest {
        company,
        period,
        actor,
    })
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
                form.bytes = Some(bytes.to_vec());
            }
            "company" | "month" | "year" | "user" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
                let slot = match name.as_str() {
                    "company" => &mut form.company,
                    "month" => &mut form.month,
                    "year" => &mut form.year,
                    _ => &mut form.user,
                };
                *slot = Some(value);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response("bad_request", message)))
}

fn api_error(err: ServerError) -> ApiError {
    let (status, kind) = match &err {
        ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        ServerError::Store(StoreError::UnknownCompany(_)) => (StatusCode::NOT_FOUND, "unknown_company"),
        ServerError::Store(StoreError::InvalidPeriod(_)) => (StatusCode::BAD_REQUEST, "invalid_period"),
        ServerError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
        ServerError::Pipeline(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.kind()),
        ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (status, Json(error_response(kind, &err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Company;

    fn state(registry: Option<FileCompanyRegistry>) -> AppState {
        let dir = tempfile::tempdir().unwrap();
        AppState {
            settings: Arc::new(Settings::default()),
            store: Arc::new(Mutex::new(FileLedgerStore::with_dir(dir.path()))),
            registry: registry.map(Arc::new),
        }
    }

    fn form(company: &str, month: &str, year: &str, user: &str) -> UploadForm {
        UploadForm {
            company: Some(company.into()),
            month: Some(month.into()),
            year: Some(year.into()),
            user: Some(user.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_import_request_without_registry() {
        let request = import_request(&state(None), &form(" ACME ", "3", "2025", "ana")).unwrap();
        assert_eq!(request.company, "ACME");
        assert_eq!(request.period.to_string(), "03/2025");
        assert_eq!(request.actor.as_str(), "ana");
    }

    #[test]
    fn test_import_request_resolves_company_name() {
        let registry = FileCompanyRegistry::new(vec![Company {
            id: "acme".into(),
            name: "ACME Comércio Ltda".into(),
            cnpj: None,
            active: true,
        }]);
        let state = state(Some(registry));

        let request = import_request(&state, &form("acme", "12", "2024", "ana")).unwrap();
        assert_eq!(request.company, "ACME Comércio Ltda");

        let err = import_request(&state, &form("nope", "12", "2024", "ana")).unwrap_err();
        assert!(matches!(err, ServerError::Store(StoreError::UnknownCompany(_))));
    }

    #[test]
    fn test_import_request_rejects_bad_fields() {
        let s = state(None);
        assert!(matches!(
            import_request(&s, &form("ACME", "13", "2025", "ana")),
            Err(ServerError::Store(StoreError::InvalidPeriod(_)))
        ));
        assert!(matches!(
            import_request(&s, &form("ACME", "mar", "2025", "ana")),
            Err(ServerError::BadRequest(_))
        ));
        assert!(matches!(
            import_request(&s, &form("ACME", "3", "2025", " ")),
            Err(ServerError::BadRequest(_))
        ));
    }

    #[test]
    fn test_api_error_status() {
        let (status, body) = api_error(ServerError::Store(StoreError::UnknownCompany("x".into())));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0["kind"], "unknown_company");
    }
}
