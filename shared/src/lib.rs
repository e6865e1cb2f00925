use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a month report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Draft,
    Submitted,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Draft => write!(f, "draft"),
            ReportStatus::Submitted => write!(f, "submitted"),
        }
    }
}

/// One member's activity for a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberMonthEntry {
    /// Same id as the roster member
    pub id: String,
    pub name: String,
    pub participated: bool,
    pub auxiliary_pioneer: bool,
    pub regular_pioneer: bool,
    pub bible_studies: u32,
    pub hours_aux: f64,
    pub hours_regular: f64,
}

/// Totals and counts over a set of entries. Hours are rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_hours_aux: f64,
    pub total_hours_regular: f64,
    pub total_bible_studies: u64,
    pub count_aux_pioneers: usize,
    pub count_regular_pioneers: usize,
    pub total_registered: usize,
    pub total_participated: usize,
    pub bible_studies_by_regular: u64,
    pub bible_studies_by_aux: u64,
    pub bible_studies_by_participated: u64,
    pub hours_by_aux_pioneers: f64,
    pub hours_by_regular_pioneers: f64,
}

/// Report document metadata. Timestamps are RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthReport {
    pub month: String,
    pub status: ReportStatus,
    pub created_at: String,
    pub created_by: String,
    pub updated_at: String,
    pub updated_by: String,
}

/// Outcome of a roster sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Complete,
    Partial,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub member_id: String,
    /// `create` or `rename`
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub group_id: String,
    pub month: String,
    pub status: SyncStatus,
    pub report_created: bool,
    pub created: Vec<String>,
    pub renamed: Vec<String>,
    pub already_present: Vec<String>,
    pub failed: Vec<SyncFailure>,
}

/// A group's month as shown on the report screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthEntriesResponse {
    pub group_id: String,
    pub month: String,
    pub month_label: String,
    /// `None` when no report document exists yet
    pub status: Option<ReportStatus>,
    pub read_only: bool,
    pub entries: Vec<MemberMonthEntry>,
    pub summary: Summary,
    /// Present when opening the month ran a roster sync
    pub sync: Option<SyncResponse>,
    /// Present when the roster sync could not run
    pub sync_error: Option<String>,
}

/// Field-level entry edit. Omitted fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub participated: Option<bool>,
    pub auxiliary_pioneer: Option<bool>,
    pub regular_pioneer: Option<bool>,
    pub bible_studies: Option<i64>,
    pub hours_aux: Option<f64>,
    pub hours_regular: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddEntryRequest {
    pub name: String,
}

/// Roster member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub moved_from: Option<String>,
    pub moved_to: Option<String>,
    /// RFC 3339
    pub moved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListResponse {
    pub group_id: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMemberRequest {
    pub to_group_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveMemberResponse {
    pub source: Member,
    pub destination: Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub number: u32,
    pub supervisor_name: String,
    pub editors: Vec<String>,
    /// Display label such as `Group 3 - Maria Silva`
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    /// `admin` or `group`
    pub role: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSupervisorRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSupervisorResponse {
    pub user: UserProfile,
    pub group: Group,
    pub previous_group_id: Option<String>,
}

/// Where a group stands for a month on the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupReportState {
    NoRecord,
    Draft,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMonthOverview {
    pub group: Group,
    pub state: GroupReportState,
    pub entries: Vec<MemberMonthEntry>,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOverviewResponse {
    pub month: String,
    pub month_label: String,
    pub groups: Vec<GroupMonthOverview>,
    pub congregation: Summary,
    pub total_entries: usize,
    pub submitted_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDeletionResult {
    pub group_id: String,
    pub entries_removed: usize,
    pub failed_entries: Vec<String>,
    pub report_removed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteMonthResponse {
    pub month: String,
    pub complete: bool,
    pub groups: Vec<GroupDeletionResult>,
}

/// `format` is `csv` (default) or `txt`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportToPathRequest {
    pub format: Option<String>,
    /// Target directory; the user's documents folder when omitted
    pub directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportToPathResponse {
    pub file_path: String,
    pub filename: String,
    pub bytes: usize,
}

/// Month the client opens by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMonthResponse {
    pub month: String,
    pub month_label: String,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable reason such as `forbidden` or `read_only`
    pub code: String,
}
