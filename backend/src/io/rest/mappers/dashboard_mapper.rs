//! Admin overview and month deletion DTO mapping.

use shared::{
    DeleteMonthResponse, GroupDeletionResult, GroupMonthOverview as GroupOverviewDto,
    GroupReportState as StateDto, MonthOverviewResponse,
};

use super::entry_mapper::EntryMapper;
use super::member_mapper::MemberMapper;
use crate::domain::commands::reports::DeleteMonthResult;
use crate::domain::dashboard_service::{GroupMonthOverview, GroupReportState, MonthOverview};

pub struct DashboardMapper;

impl DashboardMapper {
    pub fn group_to_dto(overview: GroupMonthOverview) -> GroupOverviewDto {
        GroupOverviewDto {
            group: MemberMapper::group_to_dto(overview.group),
            state: match overview.state {
                GroupReportState::NoRecord => StateDto::NoRecord,
                GroupReportState::Draft => StateDto::Draft,
                GroupReportState::Submitted => StateDto::Submitted,
            },
            summary: EntryMapper::summary_to_dto(&overview.summary),
            entries: overview.entries.into_iter().map(EntryMapper::to_dto).collect(),
        }
    }

    pub fn to_dto(overview: MonthOverview) -> MonthOverviewResponse {
        let submitted_count = overview.submitted_count();
        MonthOverviewResponse {
            month: overview.month.to_string(),
            month_label: overview.month.label(),
            congregation: EntryMapper::summary_to_dto(&overview.congregation),
            total_entries: overview.total_entries,
            submitted_count,
            groups: overview.groups.into_iter().map(Self::group_to_dto).collect(),
        }
    }

    pub fn deletion_to_dto(result: DeleteMonthResult) -> DeleteMonthResponse {
        DeleteMonthResponse {
            month: result.month.to_string(),
            complete: result.is_complete(),
            groups: result
                .groups
                .into_iter()
                .map(|g| GroupDeletionResult {
                    group_id: g.group_id,
                    entries_removed: g.entries_removed,
                    failed_entries: g.failed_entries,
                    report_removed: g.report_removed,
                    error: g.error,
                })
                .collect(),
        }
    }
}
