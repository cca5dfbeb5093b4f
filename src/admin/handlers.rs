use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::backup::BackupSummary;
use crate::error::LanderError;
use crate::hosts;
use crate::http::request::X_REQUEST_ID;
use crate::http::server::{static_page, AppState};
use crate::promotion::{PromotionReport, RestoreReport};

#[derive(Serialize)]
pub struct AdminInfo {
    #[serde(rename = "defaultPassword")]
    pub default_password: bool,
}

#[derive(Serialize)]
pub struct StatusOk {
    pub status: &'static str,
}

const OK: StatusOk = StatusOk { status: "ok" };

#[derive(Serialize)]
pub struct BackupList {
    pub backups: Vec<BackupSummary>,
}

#[derive(Deserialize)]
pub struct UploadForm {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct BackupQuery {
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct RestoreRequest {
    name: Option<String>,
}

/// Pull a non-empty backup name out of a `{"name": ...}` body.
fn restore_target(body: &[u8]) -> Result<String, LanderError> {
    let request: RestoreRequest = serde_json::from_slice(body).map_err(LanderError::InvalidPayload)?;
    match request.name {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(LanderError::MissingParameter("backup name")),
    }
}

fn required_name(query: BackupQuery) -> Result<String, LanderError> {
    query
        .name
        .filter(|n| !n.is_empty())
        .ok_or(LanderError::MissingParameter("backup name"))
}

/// Run a document mutation on its own task. Dropping the request (client
/// gone, request timeout) then no longer cancels a pipeline halfway through.
async fn detached<T, F>(mutation: F) -> Result<T, LanderError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, LanderError>> + Send + 'static,
{
    tokio::spawn(mutation).await?
}

pub async fn admin_page(State(state): State<AppState>) -> Response {
    static_page(&state.static_dir, "admin.html").await
}

pub async fn get_info(State(state): State<AppState>) -> Json<AdminInfo> {
    Json(AdminInfo {
        default_password: state.admin.uses_default_password(),
    })
}

pub async fn upload_content(
    State(state): State<AppState>,
    Form(form): Form<UploadForm>,
) -> Result<Json<StatusOk>, LanderError> {
    let content = form.content.ok_or(LanderError::MissingParameter("content"))?;
    let store = state.content.clone();
    detached(async move { store.submit(content.as_bytes()).await }).await?;
    Ok(Json(OK))
}

pub async fn get_caddyfile(State(state): State<AppState>) -> Result<Response, LanderError> {
    let text = state.caddyfile.read().await?;
    Ok(([(header::CONTENT_TYPE, "text/plain")], text).into_response())
}

/// Gate rejections come back as 200 with `success: false`.
pub async fn submit_caddyfile(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<PromotionReport>, LanderError> {
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let promoter = state.caddyfile.clone();
    let report = detached(async move { promoter.submit(&body).await }).await?;
    tracing::info!(
        request_id = %request_id,
        success = report.success,
        stage = ?report.stage,
        "Caddyfile submission handled"
    );
    Ok(Json(report))
}

pub async fn list_content_backups(State(state): State<AppState>) -> Json<BackupList> {
    Json(BackupList {
        backups: state.content.list_backups().await,
    })
}

pub async fn get_content_backup(
    State(state): State<AppState>,
    Query(query): Query<BackupQuery>,
) -> Result<Response, LanderError> {
    let name = required_name(query)?;
    let bytes = state.content.fetch_backup(&name).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

pub async fn restore_content(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StatusOk>, LanderError> {
    let name = restore_target(&body)?;
    let store = state.content.clone();
    detached(async move { store.restore(&name).await }).await?;
    Ok(Json(OK))
}

pub async fn list_caddyfile_backups(State(state): State<AppState>) -> Json<BackupList> {
    Json(BackupList {
        backups: state.caddyfile.list_backups().await,
    })
}

pub async fn get_caddyfile_backup(
    State(state): State<AppState>,
    Query(query): Query<BackupQuery>,
) -> Result<Response, LanderError> {
    let name = required_name(query)?;
    let bytes = state.caddyfile.fetch_backup(&name).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain")], bytes).into_response())
}

pub async fn restore_caddyfile(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RestoreReport>, LanderError> {
    let name = restore_target(&body)?;
    let promoter = state.caddyfile.clone();
    Ok(Json(detached(async move { promoter.restore(&name).await }).await?))
}

/// Landing-page links derived from the live Caddyfile.
pub async fn generate_content(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, LanderError> {
    let text = state.caddyfile.read().await?;
    Ok(Json(hosts::generate_content(&text)))
}
