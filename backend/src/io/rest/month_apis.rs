//! # REST API for a Group's Month
//!
//! Opening a month, roster sync, entry edits and report status.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use shared::{AddEntryRequest, UpdateEntryRequest};
use tracing::{info, warn};

use super::mappers::entry_mapper::EntryMapper;
use super::{run_blocking, ApiError, Session};
use crate::domain::commands::entries::{AddEntryCommand, RemoveEntryCommand, UpdateEntryCommand};
use crate::domain::SyncError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/:group_id/months/:month", get(open_month))
        .route("/groups/:group_id/months/:month/sync", post(sync_month))
        .route("/groups/:group_id/months/:month/entries", post(add_entry))
        .route(
            "/groups/:group_id/months/:month/entries/:entry_id",
            patch(update_entry).delete(remove_entry),
        )
        .route("/groups/:group_id/months/:month/report", get(get_report))
        .route("/groups/:group_id/months/:month/submit", post(submit_report))
        .route("/groups/:group_id/months/:month/revert", post(revert_report))
}

/// Entries, status and summary of a month. The roster is synced first when
/// this group/month has not been synced with the current roster yet; a
/// storage failure during that sync is reported alongside the entries
/// instead of failing the request.
pub async fn open_month(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/groups/{}/months/{}", group_id, month);
    let sync_service = state.sync_service.clone();
    let entry_service = state.entry_service.clone();
    let trigger = state.sync_trigger.clone();

    let response = run_blocking(move || {
        ctx.require_group_reader(&group_id)?;
        let (sync, sync_error) =
            match sync_service.sync_if_needed(&ctx, &trigger, Some(&group_id), &month) {
                Ok(report) => (report, None),
                Err(e @ (SyncError::InvalidMonth(_) | SyncError::Access(_))) => return Err(e.into()),
                Err(e) => {
                    warn!("Roster sync for {}/{} did not run: {}", group_id, month, e);
                    (None, Some(e.to_string()))
                }
            };
        let listed = entry_service.list_entries(&ctx, &group_id, &month)?;
        Ok(EntryMapper::to_month_entries_dto(listed, sync, sync_error))
    })
    .await?;
    Ok(Json(response))
}

/// Run the roster sync unconditionally.
pub async fn sync_month(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/groups/{}/months/{}/sync", group_id, month);
    let service = state.sync_service.clone();
    let report = run_blocking(move || Ok(service.sync_month(&ctx, Some(&group_id), &month)?)).await?;
    Ok(Json(EntryMapper::sync_to_dto(report)))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
    Json(request): Json<AddEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/groups/{}/months/{}/entries - {:?}", group_id, month, request);
    let service = state.entry_service.clone();
    let command = AddEntryCommand {
        group_id,
        month,
        name: request.name,
    };
    let entry = run_blocking(move || service.add_entry(&ctx, command)).await?;
    Ok((StatusCode::CREATED, Json(EntryMapper::to_dto(entry))))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month, entry_id)): Path<(String, String, String)>,
    Json(request): Json<UpdateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        "PATCH /api/groups/{}/months/{}/entries/{} - {:?}",
        group_id, month, entry_id, request
    );
    let service = state.entry_service.clone();
    let command = UpdateEntryCommand {
        group_id,
        month,
        entry_id,
        edit: EntryMapper::to_edit(request),
    };
    let entry = run_blocking(move || service.update_entry(&ctx, command)).await?;
    Ok(Json(EntryMapper::to_dto(entry)))
}

pub async fn remove_entry(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month, entry_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("DELETE /api/groups/{}/months/{}/entries/{}", group_id, month, entry_id);
    let service = state.entry_service.clone();
    let command = RemoveEntryCommand {
        group_id,
        month,
        entry_id,
    };
    run_blocking(move || service.remove_entry(&ctx, command)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_report(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/groups/{}/months/{}/report", group_id, month);
    let service = state.report_service.clone();
    let (g, m) = (group_id.clone(), month.clone());
    match run_blocking(move || service.get_report(&ctx, &g, &m)).await? {
        Some(report) => Ok(Json(EntryMapper::report_to_dto(report))),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("No report for {} in group {}", month, group_id),
        )),
    }
}

pub async fn submit_report(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/groups/{}/months/{}/submit", group_id, month);
    let service = state.report_service.clone();
    let report = run_blocking(move || service.submit(&ctx, &group_id, &month)).await?;
    Ok(Json(EntryMapper::report_to_dto(report)))
}

pub async fn revert_report(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/groups/{}/months/{}/revert", group_id, month);
    let service = state.report_service.clone();
    let report = run_blocking(move || service.revert_to_draft(&ctx, &group_id, &month)).await?;
    Ok(Json(EntryMapper::report_to_dto(report)))
}
