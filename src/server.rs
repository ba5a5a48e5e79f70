//! JSON HTTP API.
//!
//! Thin route handlers over the entity layer. Every response, success or
//! failure, uses the same envelope:
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": "Client not found" }
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/api/health` | Health check (returns version) |
//! | `GET`    | `/api/clients?cursor&limit` | One page of clients |
//! | `POST`   | `/api/clients` | Create a client (company + email required) |
//! | `GET`    | `/api/clients/{id}` | Fetch a client |
//! | `PUT`    | `/api/clients/{id}` | Patch a client |
//! | `DELETE` | `/api/clients/{id}` | Delete a client |
//! | `POST`   | `/api/clients/{id}/files` | Attach file metadata |
//! | `DELETE` | `/api/clients/{id}/files/{file_id}` | Detach file metadata |
//! | `GET`    | `/api/leads` | All leads (first 100), raw array |
//! | `POST`   | `/api/leads` | Create a lead |
//! | `PUT`    | `/api/leads/{id}/stage` | Move a lead to another stage |
//! | `GET`    | `/api/reports/config` | Client and lead pick lists |
//! | `POST`   | `/api/reports/data` | Aggregate report data |
//! | `GET`    | `/api/stats` | Pipeline and SEO dashboard numbers |
//!
//! # Error Contract
//!
//! `400` for validation failures and unreadable bodies, `404` for unknown
//! ids or routes, `500` for storage failures. 500 responses carry a generic
//! message; the cause is logged.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use apex_crm_core::analytics::{self, DashboardStats};
use apex_crm_core::entity::{clamp_limit, parse_limit, Entity, IndexedEntity, Page, MAX_PAGE_LIMIT};
use apex_crm_core::models::{Client, ClientPatch, Lead, LeadPatch, NewUploadedFile, PipelineStage};
use apex_crm_core::report::{self, pick_list, ReportData, ReportOptions, ReportRequest};
use apex_crm_core::store::Store;
use apex_crm_core::{validate, EntityError};

use crate::config::Config;
use crate::db;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    clients: Arc<IndexedEntity<Client>>,
    leads: Arc<IndexedEntity<Lead>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            clients: Arc::new(IndexedEntity::new(store.clone())),
            leads: Arc::new(IndexedEntity::new(store)),
        }
    }

    async fn seed_clients(&self) -> Result<(), EntityError> {
        if self.config.seed.enabled {
            self.clients.ensure_seed().await?;
        }
        Ok(())
    }

    async fn seed_leads(&self) -> Result<(), EntityError> {
        if self.config.seed.enabled {
            self.leads.ensure_seed().await?;
        }
        Ok(())
    }
}

/// Build the router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/clients", get(list_clients).post(create_client))
        .route(
            "/api/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/clients/{id}/files", post(add_file))
        .route(
            "/api/clients/{id}/files/{file_id}",
            axum::routing::delete(delete_file),
        )
        .route("/api/leads", get(list_leads).post(create_lead))
        .route("/api/leads/{id}/stage", put(update_lead_stage))
        .route("/api/reports/config", get(reports_config))
        .route("/api/reports/data", post(reports_data))
        .route("/api/stats", get(dashboard_stats))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Opens the configured store, binds to `[server].bind`, and serves until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = db::open_store(config).await?;
    let bind_addr = config.server.bind.clone();
    let app = router(AppState::new(config.clone(), store));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "CRM API listening");
    println!("CRM API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Envelope ============

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    data: T,
}

#[derive(Serialize)]
struct Failure {
    success: bool,
    error: String,
}

fn ok<T: Serialize>(data: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        data,
    })
}

type ApiResult<T> = Result<Json<Success<T>>, AppError>;

/// Error that converts into an enveloped Axum response.
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Failure {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: message.into(),
    }
}

impl From<EntityError> for AppError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::NotFound { entity, .. } => not_found(format!("{} not found", title(entity))),
            EntityError::Validation(message) => bad_request(message),
            EntityError::Internal(cause) => {
                tracing::error!(error = ?cause, "request failed");
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "internal error".to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(format!("invalid request body: {}", rejection.body_text()))
    }
}

fn title(entity: &str) -> String {
    let mut chars = entity.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============ Health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<Success<HealthResponse>> {
    ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_not_found() -> AppError {
    not_found("Not found")
}

// ============ Clients ============

#[derive(Debug, Deserialize)]
struct ListParams {
    cursor: Option<String>,
    limit: Option<String>,
}

async fn list_clients(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Page<Client>> {
    state.seed_clients().await?;
    let pagination = &state.config.pagination;
    let limit = clamp_limit(
        parse_limit(params.limit.as_deref()),
        pagination.default_limit,
        pagination.max_limit,
    );
    let page = state.clients.list(params.cursor.as_deref(), limit).await?;
    Ok(ok(page))
}

async fn get_client(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Client> {
    Ok(ok(state.clients.get_state(&id).await?))
}

async fn create_client(
    State(state): State<AppState>,
    body: Result<Json<ClientPatch>, JsonRejection>,
) -> ApiResult<Client> {
    let Json(fields) = body?;
    validate::new_client(fields.company.as_deref(), fields.email.as_deref())?;

    let mut client = Client::initial_state();
    client.apply_patch(fields);
    let created = state.clients.create(client).await?;
    tracing::info!(id = %created.id, company = %created.company, "client created");
    Ok(ok(created))
}

async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ClientPatch>, JsonRejection>,
) -> ApiResult<Client> {
    let Json(fields) = body?;
    if let Some(email) = fields.email.as_deref() {
        if !validate::is_valid_email(email) {
            return Err(bad_request(format!("invalid email address: {}", email)));
        }
    }
    state.clients.patch(&id, fields).await?;
    Ok(ok(state.clients.get_state(&id).await?))
}

#[derive(Serialize)]
struct Deleted {
    id: String,
    deleted: bool,
}

async fn delete_client(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Deleted> {
    if !state.clients.delete(&id).await? {
        return Err(not_found("Client not found or already deleted"));
    }
    tracing::info!(%id, "client deleted");
    Ok(ok(Deleted { id, deleted: true }))
}

async fn add_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<NewUploadedFile>, JsonRejection>,
) -> ApiResult<Client> {
    let Json(upload) = body?;
    if upload.file_name.trim().is_empty() {
        return Err(bad_request("fileName is required"));
    }
    let file = upload.into_file(&id);
    state
        .clients
        .mutate(&id, move |mut client| {
            client.uploaded_files.push(file);
            client
        })
        .await?;
    Ok(ok(state.clients.get_state(&id).await?))
}

async fn delete_file(
    State(state): State<AppState>,
    Path((id, file_id)): Path<(String, String)>,
) -> ApiResult<Client> {
    state
        .clients
        .mutate(&id, |mut client| {
            client.uploaded_files.retain(|f| f.id != file_id);
            client
        })
        .await?;
    Ok(ok(state.clients.get_state(&id).await?))
}

// ============ Leads ============

async fn list_leads(State(state): State<AppState>) -> ApiResult<Vec<Lead>> {
    state.seed_leads().await?;
    // The board shows the first page at the hard cap, independent of
    // `[pagination]`.
    let page = state.leads.list(None, MAX_PAGE_LIMIT).await?;
    Ok(ok(page.items))
}

async fn create_lead(
    State(state): State<AppState>,
    body: Result<Json<LeadPatch>, JsonRejection>,
) -> ApiResult<Lead> {
    let Json(fields) = body?;
    if fields.company.as_deref().map(str::trim).unwrap_or_default().is_empty() {
        return Err(bad_request("Company is required"));
    }
    let mut lead = Lead::initial_state();
    lead.apply_patch(fields);
    Ok(ok(state.leads.create(lead).await?))
}

#[derive(Debug, Deserialize)]
struct StageBody {
    stage: Option<String>,
}

async fn update_lead_stage(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StageBody>, JsonRejection>,
) -> ApiResult<Lead> {
    let Json(body) = body?;
    let stage = match body.stage.as_deref() {
        None => return Err(bad_request("Stage is required")),
        Some(raw) if raw.trim().is_empty() => return Err(bad_request("Stage is required")),
        Some(raw) => PipelineStage::from_label(raw)?,
    };
    state.leads.patch(&id, LeadPatch::stage(stage)).await?;
    Ok(ok(state.leads.get_state(&id).await?))
}

// ============ Reports ============

async fn reports_config(State(state): State<AppState>) -> ApiResult<ReportOptions> {
    state.seed_clients().await?;
    state.seed_leads().await?;
    let clients = state.clients.list_all().await?;
    let leads = state.leads.list_all().await?;
    Ok(ok(ReportOptions {
        clients: pick_list(&clients),
        leads: pick_list(&leads),
    }))
}

async fn reports_data(
    State(state): State<AppState>,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> ApiResult<ReportData> {
    let Json(request) = body?;
    let data = report::generate(&state.clients, &state.leads, &request).await?;
    Ok(ok(data))
}

// ============ Stats ============

async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    state.seed_clients().await?;
    state.seed_leads().await?;
    let clients = state.clients.list_all().await?;
    let leads = state.leads.list_all().await?;
    Ok(ok(analytics::dashboard(&clients, &leads)))
}
