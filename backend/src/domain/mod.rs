//! # Domain Module
//!
//! Business logic for monthly ministry reports, independent of the REST
//! layer and of the storage backend.
//!
//! ## Module Organization
//!
//! - **summary_service**: the aggregator; rolls entries up into a [`Summary`]
//! - **roster_sync_service**: copies the persistent roster into a month
//! - **entry_service**: the edit boundary for month entries
//! - **month_report_service**: submit/revert and whole-month deletion
//! - **member_service**: roster administration and supervisor assignment
//! - **dashboard_service**: admin overview of a month across groups
//! - **export_service**: spreadsheet and printable artifacts
//! - **session**: who is acting and what they may touch
//! - **sync_trigger**: remembers which group/month pairs need a re-sync
//!
//! ## Business Rules
//!
//! - A month entry's id is the roster member's id; sync never duplicates it
//! - Sync never overwrites recorded activity, it only adds rows and renames
//! - Auxiliary and regular pioneer are mutually exclusive per entry
//! - A submitted month is read-only until reverted to draft
//! - Summaries merge exactly; rounding happens only for display

pub mod commands;
pub mod dashboard_service;
pub mod entry_service;
pub mod export_service;
pub mod member_service;
pub mod models;
pub mod month_report_service;
pub mod retry;
pub mod roster_sync_service;
pub mod session;
pub mod summary_service;
pub mod sync_trigger;

pub use dashboard_service::DashboardService;
pub use entry_service::{EntryEditError, EntryService};
pub use export_service::{ExportArtifact, ExportFormat, ExportService};
pub use member_service::{MemberError, MemberService};
pub use models::Summary;
pub use month_report_service::MonthReportService;
pub use retry::RetryPolicy;
pub use roster_sync_service::{RosterSyncService, SyncError, SyncReport, SyncStatus};
pub use session::{AccessError, SessionContext};
pub use sync_trigger::SyncTrigger;
