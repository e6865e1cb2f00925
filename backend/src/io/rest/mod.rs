//! # REST API Interface Layer
//!
//! HTTP endpoints for the ministry report backend, all under `/api`.
//!
//! - **Identity**: every request carries `x-user-id`; the id is resolved
//!   against the stored profiles into an explicit `SessionContext` and
//!   passed to the services.
//! - **Errors**: domain errors become status codes in [`error`]; every
//!   failure body is a `shared::ErrorResponse`.
//! - **Blocking work**: services do synchronous file IO and may sleep
//!   between retries, so handlers run them on the blocking pool.
//!
//! ## Endpoints
//!
//! - `GET /api/session`, `GET /api/groups`, `PUT /api/groups/:group/supervisor`
//! - `GET|POST /api/groups/:group/members`, `PUT|DELETE .../members/:id`,
//!   `POST .../members/:id/move`
//! - `GET /api/groups/:group/months/:month` (opens the month, syncing the
//!   roster when needed), `POST .../sync`, `POST .../entries`,
//!   `PATCH|DELETE .../entries/:id`, `GET .../report`, `POST .../submit`,
//!   `POST .../revert`
//! - `GET /api/months/current`, `GET /api/months/:month/overview`,
//!   `GET /api/groups/:group/months/:month/overview`, `DELETE /api/months/:month`
//! - `GET .../export?format=csv|txt` and `POST .../export/to-path` for a
//!   group month and for the congregation month

pub mod dashboard_apis;
pub mod error;
pub mod export_apis;
pub mod mappers;
pub mod member_apis;
pub mod month_apis;
pub mod session;

use axum::Router;

use crate::AppState;
pub use error::ApiError;
pub use session::{Session, USER_ID_HEADER};

/// Every API route, relative to `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(member_apis::router())
        .merge(month_apis::router())
        .merge(dashboard_apis::router())
        .merge(export_apis::router())
}

/// Run a synchronous service call on the blocking pool.
pub async fn run_blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(op).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError::internal(format!("Background task failed: {}", e))),
    }
}
