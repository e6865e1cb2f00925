//! Entry, summary, report and sync DTO mapping.

use shared::{
    MemberMonthEntry as EntryDto, MonthEntriesResponse, MonthReport as ReportDto,
    ReportStatus as StatusDto, Summary as SummaryDto, SyncFailure, SyncResponse,
    SyncStatus as SyncStatusDto, UpdateEntryRequest,
};

use crate::domain::commands::entries::{EntryEdit, ListEntriesResult};
use crate::domain::models::{MemberMonthEntry, MonthReport, ReportStatus, Summary};
use crate::domain::roster_sync_service::{SyncReport, SyncStatus, WriteKind};

pub struct EntryMapper;

impl EntryMapper {
    pub fn to_dto(entry: MemberMonthEntry) -> EntryDto {
        EntryDto {
            id: entry.id,
            name: entry.name,
            participated: entry.participated,
            auxiliary_pioneer: entry.auxiliary_pioneer,
            regular_pioneer: entry.regular_pioneer,
            bible_studies: entry.bible_studies,
            hours_aux: entry.hours_aux,
            hours_regular: entry.hours_regular,
        }
    }

    pub fn to_edit(request: UpdateEntryRequest) -> EntryEdit {
        EntryEdit {
            participated: request.participated,
            auxiliary_pioneer: request.auxiliary_pioneer,
            regular_pioneer: request.regular_pioneer,
            bible_studies: request.bible_studies,
            hours_aux: request.hours_aux,
            hours_regular: request.hours_regular,
        }
    }

    /// Summaries leave the backend rounded to one decimal.
    pub fn summary_to_dto(summary: &Summary) -> SummaryDto {
        let s = summary.rounded();
        SummaryDto {
            total_hours_aux: s.total_hours_aux,
            total_hours_regular: s.total_hours_regular,
            total_bible_studies: s.total_bible_studies,
            count_aux_pioneers: s.count_aux_pioneers,
            count_regular_pioneers: s.count_regular_pioneers,
            total_registered: s.total_registered,
            total_participated: s.total_participated,
            bible_studies_by_regular: s.bible_studies_by_regular,
            bible_studies_by_aux: s.bible_studies_by_aux,
            bible_studies_by_participated: s.bible_studies_by_participated,
            hours_by_aux_pioneers: s.hours_by_aux_pioneers,
            hours_by_regular_pioneers: s.hours_by_regular_pioneers,
        }
    }

    pub fn status_to_dto(status: ReportStatus) -> StatusDto {
        match status {
            ReportStatus::Draft => StatusDto::Draft,
            ReportStatus::Submitted => StatusDto::Submitted,
        }
    }

    pub fn report_to_dto(report: MonthReport) -> ReportDto {
        ReportDto {
            month: report.month.to_string(),
            status: Self::status_to_dto(report.status),
            created_at: report.created_at.to_rfc3339(),
            created_by: report.created_by,
            updated_at: report.updated_at.to_rfc3339(),
            updated_by: report.updated_by,
        }
    }

    pub fn sync_to_dto(report: SyncReport) -> SyncResponse {
        let status = match report.status() {
            SyncStatus::Complete => SyncStatusDto::Complete,
            SyncStatus::Partial => SyncStatusDto::Partial,
            SyncStatus::Failed => SyncStatusDto::Failed,
        };
        SyncResponse {
            group_id: report.group_id,
            month: report.month.to_string(),
            status,
            report_created: report.report_created,
            created: report.created,
            renamed: report.renamed,
            already_present: report.already_present,
            failed: report
                .failed
                .into_iter()
                .map(|f| SyncFailure {
                    member_id: f.member_id,
                    kind: match f.kind {
                        WriteKind::Create => "create".to_string(),
                        WriteKind::Rename => "rename".to_string(),
                    },
                    error: f.error,
                })
                .collect(),
        }
    }

    pub fn to_month_entries_dto(
        result: ListEntriesResult,
        sync: Option<SyncReport>,
        sync_error: Option<String>,
    ) -> MonthEntriesResponse {
        MonthEntriesResponse {
            group_id: result.group_id,
            month: result.month.to_string(),
            month_label: result.month.label(),
            status: result.status.map(Self::status_to_dto),
            read_only: result.status.map(|s| s.is_read_only()).unwrap_or(false),
            summary: Self::summary_to_dto(&result.summary),
            entries: result.entries.into_iter().map(Self::to_dto).collect(),
            sync: sync.map(Self::sync_to_dto),
            sync_error,
        }
    }
}
