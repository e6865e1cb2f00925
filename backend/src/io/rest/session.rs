//! Identity extraction.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use super::{run_blocking, ApiError};
use crate::domain::SessionContext;
use crate::AppState;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller, resolved from `x-user-id` against the stored profiles.
#[derive(Debug, Clone)]
pub struct Session(pub SessionContext);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(ApiError::unauthenticated)?
            .to_string();

        let users = state.users.clone();
        let ctx = run_blocking(move || SessionContext::resolve(&users, &user_id)).await?;
        debug!("Request by {} ({})", ctx.user_id, ctx.role);
        Ok(Session(ctx))
    }
}
