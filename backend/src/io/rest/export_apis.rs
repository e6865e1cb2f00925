//! # REST API for Data Export
//!
//! Downloads of spreadsheet/printable artifacts and writing them straight
//! to a directory on the server machine.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{ExportQuery, ExportToPathRequest, ExportToPathResponse};
use tracing::info;

use super::{run_blocking, ApiError, Session};
use crate::domain::export_service::{export_to_path, ExportArtifact, ExportFormat};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/:group_id/months/:month/export", get(export_group_month))
        .route("/groups/:group_id/months/:month/export/to-path", post(export_group_month_to_path))
        .route("/months/:month/export", get(export_congregation_month))
        .route("/months/:month/export/to-path", post(export_congregation_month_to_path))
}

fn parse_format(format: Option<&str>) -> Result<ExportFormat, ApiError> {
    match format {
        None => Ok(ExportFormat::Spreadsheet),
        Some(raw) => ExportFormat::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown export format '{}'", raw))),
    }
}

fn download(artifact: ExportArtifact) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
}

fn written(artifact: &ExportArtifact, path: std::path::PathBuf) -> ExportToPathResponse {
    ExportToPathResponse {
        file_path: path.to_string_lossy().to_string(),
        filename: artifact.filename.clone(),
        bytes: artifact.bytes.len(),
    }
}

pub async fn export_group_month(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/groups/{}/months/{}/export - {:?}", group_id, month, query);
    let format = parse_format(query.format.as_deref())?;
    let service = state.export_service.clone();
    let artifact = run_blocking(move || service.group_month(&ctx, &group_id, &month, format)).await?;
    Ok(download(artifact))
}

pub async fn export_congregation_month(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path(month): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/months/{}/export - {:?}", month, query);
    let format = parse_format(query.format.as_deref())?;
    let service = state.export_service.clone();
    let artifact = run_blocking(move || service.congregation_month(&ctx, &month, format)).await?;
    Ok(download(artifact))
}

pub async fn export_group_month_to_path(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
    Json(request): Json<ExportToPathRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        "POST /api/groups/{}/months/{}/export/to-path - {:?}",
        group_id, month, request.directory
    );
    let format = parse_format(request.format.as_deref())?;
    let service = state.export_service.clone();
    let response = run_blocking(move || {
        let artifact = service.group_month(&ctx, &group_id, &month, format)?;
        let path = export_to_path(&artifact, request.directory.as_deref())?;
        Ok(written(&artifact, path))
    })
    .await?;
    Ok(Json(response))
}

pub async fn export_congregation_month_to_path(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path(month): Path<String>,
    Json(request): Json<ExportToPathRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/months/{}/export/to-path - {:?}", month, request.directory);
    let format = parse_format(request.format.as_deref())?;
    let service = state.export_service.clone();
    let response = run_blocking(move || {
        let artifact = service.congregation_month(&ctx, &month, format)?;
        let path = export_to_path(&artifact, request.directory.as_deref())?;
        Ok(written(&artifact, path))
    })
    .await?;
    Ok(Json(response))
}
