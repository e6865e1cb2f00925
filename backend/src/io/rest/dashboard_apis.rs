//! # REST API for the Admin Dashboard
//!
//! Congregation overview of a month and whole-month deletion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use shared::CurrentMonthResponse;
use tracing::{info, warn};

use super::mappers::dashboard_mapper::DashboardMapper;
use super::{run_blocking, ApiError, Session};
use crate::domain::models::MonthId;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/months/current", get(current_month))
        .route("/months/:month/overview", get(month_overview))
        .route("/groups/:group_id/months/:month/overview", get(group_overview))
        .route("/months/:month", delete(delete_month))
}

/// The month on the server's clock, which clients open by default.
pub async fn current_month(Session(_ctx): Session) -> impl IntoResponse {
    let month = MonthId::current();
    Json(CurrentMonthResponse {
        month: month.to_string(),
        month_label: month.label(),
    })
}

pub async fn month_overview(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path(month): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/months/{}/overview", month);
    let service = state.dashboard_service.clone();
    let overview = run_blocking(move || service.month_overview(&ctx, &month)).await?;
    Ok(Json(DashboardMapper::to_dto(overview)))
}

pub async fn group_overview(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, month)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/groups/{}/months/{}/overview", group_id, month);
    let service = state.dashboard_service.clone();
    let overview = run_blocking(move || service.group_overview(&ctx, &group_id, &month)).await?;
    Ok(Json(DashboardMapper::group_to_dto(overview)))
}

/// Delete a month for every group. Answers 200 when everything was removed
/// and 207 when some groups kept entries (and therefore their report).
pub async fn delete_month(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path(month): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("DELETE /api/months/{} by {}", month, ctx.user_id);
    let service = state.report_service.clone();
    let result = run_blocking(move || service.delete_month(&ctx, &month)).await?;

    state.sync_trigger.forget_month(&result.month);
    let status = if result.is_complete() {
        StatusCode::OK
    } else {
        warn!("Month {} only partially deleted", result.month);
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(DashboardMapper::deletion_to_dto(result))))
}
