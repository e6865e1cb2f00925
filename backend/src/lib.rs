//! # Ministry Report Backend
//!
//! Contains all non-UI logic for the monthly ministry report: group rosters,
//! per-member month entries, roster synchronization, aggregation and exports.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer (web client)
//!     ↓
//! IO Layer (REST API, handlers, DTO mappers)
//!     ↓
//! Domain Layer (sessions, sync, aggregation, reports, exports)
//!     ↓
//! Storage Layer (CSV/YAML documents, change notification)
//! ```
//!
//! ## Key Responsibilities
//!
//! - Initialize the application state from [`config::Config`]
//! - Set up the REST API router with CORS and request tracing
//! - Re-run roster sync for opened months when a roster changes

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::{info, warn};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::domain::{
    DashboardService, EntryService, ExportService, MemberService, MonthReportService,
    RosterSyncService, SessionContext, SyncTrigger,
};
use crate::storage::csv::UserRepository;
use crate::storage::{ChangeScope, Connection, CsvConnection};

/// User id recorded on writes made by the roster watcher.
pub const SYSTEM_USER: &str = "system";

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub connection: CsvConnection,
    pub users: UserRepository,
    pub entry_service: EntryService<CsvConnection>,
    pub sync_service: RosterSyncService<CsvConnection>,
    pub report_service: MonthReportService<CsvConnection>,
    pub member_service: MemberService<CsvConnection>,
    pub dashboard_service: DashboardService<CsvConnection>,
    pub export_service: ExportService<CsvConnection>,
    pub sync_trigger: SyncTrigger,
}

impl AppState {
    pub fn new(connection: CsvConnection, config: &Config) -> Self {
        let retry = config.retry_policy();
        Self {
            users: connection.create_user_repository(),
            entry_service: EntryService::new(&connection),
            sync_service: RosterSyncService::new(&connection, retry),
            report_service: MonthReportService::new(&connection, retry),
            member_service: MemberService::new(&connection),
            dashboard_service: DashboardService::new(&connection),
            export_service: ExportService::new(&connection, &config.report.congregation_name),
            sync_trigger: SyncTrigger::new(),
            connection,
        }
    }
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: &Config) -> Result<AppState> {
    let data_directory = config.data_directory()?;
    info!("Setting up storage in {}", data_directory.display());
    let connection = CsvConnection::new(&data_directory)
        .with_context(|| format!("Failed to open data directory {}", data_directory.display()))?;

    info!("Setting up application state");
    Ok(AppState::new(connection, config))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, allowed_origin: &str) -> Result<Router> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed origin: {}", allowed_origin))?;

    // CORS setup to allow the web client to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", io::rest::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}

/// Re-run roster sync for every opened month of a group whose roster
/// changed. Runs until the connection's notifier goes away.
pub fn spawn_roster_watcher(state: AppState) -> JoinHandle<()> {
    let mut subscription = state.connection.notifier().subscribe(None);

    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            let ChangeScope::Roster { group_id } = event.scope else {
                continue;
            };
            let months = state.sync_trigger.opened_months(&group_id);
            if months.is_empty() {
                continue;
            }

            info!("Roster of {} changed, re-syncing {} opened months", group_id, months.len());
            let sync_service = state.sync_service.clone();
            let trigger = state.sync_trigger.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let ctx = SessionContext::admin(SYSTEM_USER);
                for month in months {
                    let month = month.to_string();
                    match sync_service.sync_if_needed(&ctx, &trigger, Some(&group_id), &month) {
                        Ok(Some(report)) if !report.is_complete() => {
                            warn!("Re-sync of {}/{} left {} failed writes", group_id, month, report.failed.len())
                        }
                        Ok(_) => {}
                        Err(e) => warn!("Re-sync of {}/{} failed: {}", group_id, month, e),
                    }
                }
            })
            .await;

            if let Err(e) = outcome {
                warn!("Roster re-sync task panicked: {}", e);
            }
        }
        info!("Change notifier closed, roster watcher stopped");
    })
}
