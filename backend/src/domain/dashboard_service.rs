//! # Dashboard Service
//!
//! Read-only month overview: every group with its report state, entries and
//! summary, plus congregation totals merged from the group summaries.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;

use crate::domain::entry_service::sort_by_name;
use crate::domain::member_service::MemberError;
use crate::domain::models::{Group, MemberMonthEntry, MonthId, ReportStatus, Summary};
use crate::domain::session::SessionContext;
use crate::domain::summary_service::{summarize, summarize_groups};
use crate::storage::traits::{Connection, EntryStorage, GroupStorage, MonthReportStorage};

/// Where a group stands for a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupReportState {
    /// No report document exists for the month yet.
    NoRecord,
    Draft,
    Submitted,
}

impl GroupReportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupReportState::NoRecord => "no record",
            GroupReportState::Draft => "draft",
            GroupReportState::Submitted => "submitted",
        }
    }
}

impl From<Option<ReportStatus>> for GroupReportState {
    fn from(status: Option<ReportStatus>) -> Self {
        match status {
            None => GroupReportState::NoRecord,
            Some(ReportStatus::Draft) => GroupReportState::Draft,
            Some(ReportStatus::Submitted) => GroupReportState::Submitted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupMonthOverview {
    pub group: Group,
    pub state: GroupReportState,
    /// Sorted by name.
    pub entries: Vec<MemberMonthEntry>,
    pub summary: Summary,
}

#[derive(Debug, Clone)]
pub struct MonthOverview {
    pub month: MonthId,
    /// Sorted by group number.
    pub groups: Vec<GroupMonthOverview>,
    pub congregation: Summary,
    pub total_entries: usize,
}

impl MonthOverview {
    pub fn submitted_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| g.state == GroupReportState::Submitted)
            .count()
    }
}

#[derive(Clone)]
pub struct DashboardService<C: Connection> {
    groups: C::GroupRepository,
    reports: C::ReportRepository,
    entries: C::EntryRepository,
}

impl<C: Connection> DashboardService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            groups: connection.create_group_repository(),
            reports: connection.create_report_repository(),
            entries: connection.create_entry_repository(),
        }
    }

    /// Whole-congregation view of a month (admin only).
    pub fn month_overview(&self, ctx: &SessionContext, month: &str) -> Result<MonthOverview> {
        ctx.require_admin()?;
        let month = MonthId::parse(month)?;

        let groups = self
            .groups
            .list_groups()?
            .into_iter()
            .map(|group| self.load(group, &month))
            .collect::<Result<Vec<_>>>()?;

        let congregation = summarize_groups(groups.iter().map(|g| g.summary.clone()));
        let total_entries = groups.iter().map(|g| g.entries.len()).sum();
        debug!(
            "Overview of {}: {} groups, {} entries",
            month,
            groups.len(),
            total_entries
        );

        Ok(MonthOverview {
            month,
            groups,
            congregation,
            total_entries,
        })
    }

    /// One group's month, readable by admins and by the group's supervisor.
    pub fn group_overview(
        &self,
        ctx: &SessionContext,
        group_id: &str,
        month: &str,
    ) -> Result<GroupMonthOverview> {
        ctx.require_group_reader(group_id)?;
        let month = MonthId::parse(month)?;
        let group = self
            .groups
            .get_group(group_id)?
            .ok_or_else(|| MemberError::GroupNotFound(group_id.to_string()))?;
        self.load(group, &month)
    }

    fn load(&self, group: Group, month: &MonthId) -> Result<GroupMonthOverview> {
        let status = self
            .reports
            .get_report(&group.id, month)
            .with_context(|| format!("Failed to read report {} of group {}", month, group.id))?
            .map(|r| r.status);
        let mut entries = self
            .entries
            .list_entries(&group.id, month)
            .with_context(|| format!("Failed to read entries {} of group {}", month, group.id))?;
        sort_by_name(&mut entries);
        let summary = summarize(&entries);

        Ok(GroupMonthOverview {
            group,
            state: status.into(),
            entries,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::AccessError;
    use crate::storage::csv::test_utils::TestEnvironment;
    use crate::storage::csv::CsvConnection;

    fn feb() -> MonthId {
        MonthId::new(2026, 2).unwrap()
    }

    fn entry(id: &str, aux: bool, hours_aux: f64, studies: u32) -> MemberMonthEntry {
        MemberMonthEntry {
            participated: true,
            auxiliary_pioneer: aux,
            hours_aux,
            bible_studies: studies,
            ..MemberMonthEntry::blank(id, id)
        }
    }

    fn seeded() -> TestEnvironment {
        let env = TestEnvironment::new().unwrap();
        let helper = env.helper();
        helper.create_group("g2", 2, "sup2").unwrap();
        helper.create_group("g1", 1, "sup1").unwrap();
        helper.create_group("g3", 3, "sup3").unwrap();

        helper.create_draft("g1", &feb()).unwrap();
        helper.insert_entry("g1", &feb(), entry("bia", true, 10.5, 1)).unwrap();
        helper.insert_entry("g1", &feb(), entry("ana", false, 0.0, 2)).unwrap();

        helper.create_draft("g2", &feb()).unwrap();
        env.connection
            .create_report_repository()
            .update_status("g2", &feb(), ReportStatus::Submitted, "sup2", chrono::Utc::now())
            .unwrap();
        helper.insert_entry("g2", &feb(), entry("caio", true, 2.0, 0)).unwrap();
        env
    }

    fn service(env: &TestEnvironment) -> DashboardService<CsvConnection> {
        DashboardService::new(&env.connection)
    }

    #[test]
    fn test_month_overview() {
        let env = seeded();
        let overview = service(&env)
            .month_overview(&SessionContext::admin("root"), "2026-02")
            .unwrap();

        let ids: Vec<&str> = overview.groups.iter().map(|g| g.group.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3"]);
        let states: Vec<GroupReportState> = overview.groups.iter().map(|g| g.state).collect();
        assert_eq!(
            states,
            vec![
                GroupReportState::Draft,
                GroupReportState::Submitted,
                GroupReportState::NoRecord
            ]
        );
        assert_eq!(overview.groups[0].entries[0].id, "ana");
        assert_eq!(overview.total_entries, 3);
        assert_eq!(overview.submitted_count(), 1);

        assert_eq!(overview.congregation.total_hours_aux, 12.5);
        assert_eq!(overview.congregation.count_aux_pioneers, 2);
        assert_eq!(overview.congregation.total_bible_studies, 3);
        assert_eq!(overview.congregation.total_registered, 3);
        assert!(overview.groups[2].summary.is_empty());
    }

    #[test]
    fn test_month_overview_is_admin_only() {
        let env = seeded();
        let err = service(&env)
            .month_overview(&SessionContext::supervisor("sup1", "g1"), "2026-02")
            .unwrap_err();
        assert_eq!(err.downcast_ref::<AccessError>(), Some(&AccessError::AdminRequired));
    }

    #[test]
    fn test_group_overview() {
        let env = seeded();
        let svc = service(&env);

        let own = svc
            .group_overview(&SessionContext::supervisor("sup1", "g1"), "g1", "2026-02")
            .unwrap();
        assert_eq!(own.entries.len(), 2);
        assert_eq!(own.summary.total_hours_aux, 10.5);

        assert!(svc
            .group_overview(&SessionContext::supervisor("sup1", "g1"), "g2", "2026-02")
            .is_err());
        let err = svc
            .group_overview(&SessionContext::admin("root"), "g9", "2026-02")
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<MemberError>(), Some(MemberError::GroupNotFound(_))));
    }
}
