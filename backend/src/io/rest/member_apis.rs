//! # REST API for Groups and Rosters
//!
//! Session lookup, group listing, roster management and supervisor
//! assignment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use shared::{
    AssignSupervisorRequest, CreateMemberRequest, GroupListResponse, MoveMemberRequest,
    UpdateMemberRequest,
};
use tracing::info;

use super::mappers::member_mapper::MemberMapper;
use super::{run_blocking, ApiError, Session};
use crate::domain::commands::members::{
    AddMemberCommand, AssignSupervisorCommand, DeleteMemberCommand, MoveMemberCommand,
    UpdateMemberCommand,
};
use crate::domain::session::AccessError;
use crate::storage::traits::UserStorage;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/groups", get(list_groups))
        .route("/groups/:group_id/supervisor", put(assign_supervisor))
        .route("/groups/:group_id/members", get(list_members).post(add_member))
        .route(
            "/groups/:group_id/members/:member_id",
            put(update_member).delete(delete_member),
        )
        .route("/groups/:group_id/members/:member_id/move", post(move_member))
}

/// The caller's own profile
pub async fn get_session(
    State(state): State<AppState>,
    Session(ctx): Session,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/session - {}", ctx.user_id);
    let users = state.users.clone();
    let profile = run_blocking(move || {
        users
            .get_profile(&ctx.user_id)?
            .ok_or_else(|| AccessError::UnknownUser(ctx.user_id.clone()).into())
    })
    .await?;
    Ok(Json(MemberMapper::profile_to_dto(profile)))
}

pub async fn list_groups(
    State(state): State<AppState>,
    Session(ctx): Session,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/groups");
    let service = state.member_service.clone();
    let groups = run_blocking(move || service.list_groups(&ctx)).await?;
    Ok(Json(GroupListResponse {
        groups: groups.into_iter().map(MemberMapper::group_to_dto).collect(),
    }))
}

pub async fn assign_supervisor(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path(group_id): Path<String>,
    Json(request): Json<AssignSupervisorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("PUT /api/groups/{}/supervisor - user {}", group_id, request.user_id);
    let service = state.member_service.clone();
    let command = AssignSupervisorCommand {
        user_id: request.user_id,
        group_id,
    };
    let result = run_blocking(move || service.assign_supervisor(&ctx, command)).await?;
    Ok(Json(MemberMapper::to_assign_dto(result)))
}

pub async fn list_members(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path(group_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    info!("GET /api/groups/{}/members", group_id);
    let service = state.member_service.clone();
    let id = group_id.clone();
    let members = run_blocking(move || service.list_members(&ctx, &id)).await?;
    Ok(Json(MemberMapper::to_list_dto(&group_id, members)))
}

pub async fn add_member(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path(group_id): Path<String>,
    Json(request): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("POST /api/groups/{}/members - {:?}", group_id, request);
    let service = state.member_service.clone();
    let command = AddMemberCommand {
        group_id,
        name: request.name,
    };
    let member = run_blocking(move || service.add_member(&ctx, command)).await?;
    Ok((StatusCode::CREATED, Json(MemberMapper::to_dto(member))))
}

pub async fn update_member(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, member_id)): Path<(String, String)>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!("PUT /api/groups/{}/members/{} - {:?}", group_id, member_id, request);
    let service = state.member_service.clone();
    let command = UpdateMemberCommand {
        group_id,
        member_id,
        name: request.name,
        active: request.active,
    };
    let member = run_blocking(move || service.update_member(&ctx, command)).await?;
    Ok(Json(MemberMapper::to_dto(member)))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, member_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    info!("DELETE /api/groups/{}/members/{}", group_id, member_id);
    let service = state.member_service.clone();
    let command = DeleteMemberCommand { group_id, member_id };
    run_blocking(move || service.delete_member(&ctx, command)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_member(
    State(state): State<AppState>,
    Session(ctx): Session,
    Path((group_id, member_id)): Path<(String, String)>,
    Json(request): Json<MoveMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        "POST /api/groups/{}/members/{}/move - to {}",
        group_id, member_id, request.to_group_id
    );
    let service = state.member_service.clone();
    let command = MoveMemberCommand {
        from_group_id: group_id,
        member_id,
        to_group_id: request.to_group_id,
    };
    let result = run_blocking(move || service.move_member(&ctx, command)).await?;
    Ok(Json(MemberMapper::to_move_dto(result)))
}
