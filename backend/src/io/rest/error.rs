//! Translation of domain errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use tracing::error;

use crate::domain::models::MonthIdError;
use crate::domain::{AccessError, EntryEditError, MemberError, SyncError};

/// Error returned by every handler. The body is a [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", "Missing x-user-id header")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }
}

fn from_access(e: &AccessError) -> ApiError {
    match e {
        AccessError::UnknownUser(_) => ApiError::new(StatusCode::UNAUTHORIZED, "unknown_user", e.to_string()),
        AccessError::GroupRequired => ApiError::new(StatusCode::BAD_REQUEST, "group_required", e.to_string()),
        _ => ApiError::new(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
    }
}

fn from_month(e: &MonthIdError) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "invalid_month", e.to_string())
}

fn from_edit(e: &EntryEditError) -> ApiError {
    match e {
        EntryEditError::ReportSubmitted { .. } => ApiError::new(StatusCode::CONFLICT, "read_only", e.to_string()),
        EntryEditError::EntryNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        EntryEditError::NoFreeId(_) => ApiError::new(StatusCode::CONFLICT, "conflict", e.to_string()),
        _ => ApiError::new(StatusCode::BAD_REQUEST, "invalid_edit", e.to_string()),
    }
}

fn from_member(e: &MemberError) -> ApiError {
    match e {
        MemberError::MemberNotFound { .. } | MemberError::GroupNotFound(_) | MemberError::UserNotFound(_) => {
            ApiError::new(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        MemberError::NoFreeId(_) => ApiError::new(StatusCode::CONFLICT, "conflict", e.to_string()),
        _ => ApiError::new(StatusCode::BAD_REQUEST, "invalid_member", e.to_string()),
    }
}

fn from_sync(e: &SyncError) -> ApiError {
    match e {
        SyncError::InvalidMonth(inner) => from_month(inner),
        SyncError::Access(inner) => from_access(inner),
        _ => ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", e.to_string()),
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        if let Some(inner) = e.downcast_ref::<AccessError>() {
            return from_access(inner);
        }
        if let Some(inner) = e.downcast_ref::<MonthIdError>() {
            return from_month(inner);
        }
        if let Some(inner) = e.downcast_ref::<EntryEditError>() {
            return from_edit(inner);
        }
        if let Some(inner) = e.downcast_ref::<MemberError>() {
            return from_member(inner);
        }
        if let Some(inner) = e.downcast_ref::<SyncError>() {
            return from_sync(inner);
        }
        error!("Unhandled error: {:?}", e);
        ApiError::internal(e.to_string())
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        from_sync(&e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
