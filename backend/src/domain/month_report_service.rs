//! # Month Report Service
//!
//! Report status transitions and administrative month deletion.
//!
//! Status moves `draft → submitted → draft` under the supervisor's control;
//! both transitions create the report as draft first when it does not exist
//! yet. Deleting a month removes every group's entries before the report
//! document, and keeps the report whenever an entry could not be removed, so
//! a failed deletion never leaves entries without their report.

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};

use crate::domain::commands::reports::{DeleteMonthResult, GroupDeletion};
use crate::domain::models::{MonthId, MonthReport, ReportStatus};
use crate::domain::retry::RetryPolicy;
use crate::domain::session::SessionContext;
use crate::storage::traits::{Connection, EntryStorage, GroupStorage, MonthReportStorage};

#[derive(Clone)]
pub struct MonthReportService<C: Connection> {
    groups: C::GroupRepository,
    reports: C::ReportRepository,
    entries: C::EntryRepository,
    retry: RetryPolicy,
}

impl<C: Connection> MonthReportService<C> {
    pub fn new(connection: &C, retry: RetryPolicy) -> Self {
        Self {
            groups: connection.create_group_repository(),
            reports: connection.create_report_repository(),
            entries: connection.create_entry_repository(),
            retry,
        }
    }

    pub fn get_report(&self, ctx: &SessionContext, group_id: &str, month: &str) -> Result<Option<MonthReport>> {
        ctx.require_group_reader(group_id)?;
        let month = MonthId::parse(month)?;
        self.reports.get_report(group_id, &month)
    }

    /// Lock the month's entries against further edits.
    pub fn submit(&self, ctx: &SessionContext, group_id: &str, month: &str) -> Result<MonthReport> {
        self.set_status(ctx, group_id, month, ReportStatus::Submitted)
    }

    /// Reopen a submitted month for editing.
    pub fn revert_to_draft(&self, ctx: &SessionContext, group_id: &str, month: &str) -> Result<MonthReport> {
        self.set_status(ctx, group_id, month, ReportStatus::Draft)
    }

    fn set_status(
        &self,
        ctx: &SessionContext,
        group_id: &str,
        month: &str,
        status: ReportStatus,
    ) -> Result<MonthReport> {
        ctx.require_group_editor(group_id)?;
        let month = MonthId::parse(month)?;
        let now = Utc::now();

        self.reports
            .create_report_if_absent(group_id, &MonthReport::new_draft(month, &ctx.user_id, now))?;

        let current = self.reports.get_report(group_id, &month)?;
        if current.as_ref().map(|r| r.status) != Some(status) {
            self.reports
                .update_status(group_id, &month, status, &ctx.user_id, now)?;
            info!("Report {} of group {} set to {} by {}", month, group_id, status, ctx.user_id);
        }

        self.reports
            .get_report(group_id, &month)?
            .ok_or_else(|| anyhow::anyhow!("Report {} of group {} disappeared", month, group_id))
    }

    /// Remove a month's entries and report for every group (admin only).
    pub fn delete_month(&self, ctx: &SessionContext, month: &str) -> Result<DeleteMonthResult> {
        ctx.require_admin()?;
        let month = MonthId::parse(month)?;
        info!("Deleting month {} for all groups, requested by {}", month, ctx.user_id);

        let groups = self.groups.list_groups()?;
        let outcomes: Vec<GroupDeletion> = groups
            .iter()
            .map(|group| self.delete_group_month(&group.id, &month))
            .collect();

        let result = DeleteMonthResult {
            month,
            groups: outcomes,
        };
        if result.is_complete() {
            info!("Month {} deleted for {} groups", month, result.groups.len());
        } else {
            warn!("Month {} only partially deleted", month);
        }
        Ok(result)
    }

    fn delete_group_month(&self, group_id: &str, month: &MonthId) -> GroupDeletion {
        let mut outcome = GroupDeletion {
            group_id: group_id.to_string(),
            entries_removed: 0,
            failed_entries: Vec::new(),
            report_removed: false,
            error: None,
        };

        let entries = match self
            .retry
            .run("list entries", || self.entries.list_entries(group_id, month))
        {
            Ok(entries) => entries,
            Err(e) => {
                error!("Cannot list entries of {}/{}: {}", group_id, month, e);
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        for entry in &entries {
            match self
                .retry
                .run("delete entry", || self.entries.delete_entry(group_id, month, &entry.id))
            {
                Ok(true) => outcome.entries_removed += 1,
                Ok(false) => {}
                Err(e) => warn!("Could not delete entry {} of {}/{}: {}", entry.id, group_id, month, e),
            }
        }

        // Decide on what is actually left rather than on the delete results.
        match self.entries.list_entries(group_id, month) {
            Ok(remaining) if remaining.is_empty() => {}
            Ok(remaining) => {
                outcome.failed_entries = remaining.into_iter().map(|e| e.id).collect();
                warn!(
                    "Keeping report {}/{}: {} entries could not be removed",
                    group_id,
                    month,
                    outcome.failed_entries.len()
                );
                return outcome;
            }
            Err(e) => {
                outcome.error = Some(e.to_string());
                return outcome;
            }
        }

        match self
            .retry
            .run("delete report", || self.reports.delete_report(group_id, month))
        {
            Ok(removed) => outcome.report_removed = removed,
            Err(e) => {
                error!("Could not delete report {}/{}: {}", group_id, month, e);
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MemberMonthEntry;
    use crate::domain::session::AccessError;
    use crate::storage::csv::test_utils::{FlakyConnection, TestEnvironment};
    use crate::storage::csv::CsvConnection;

    fn feb() -> MonthId {
        MonthId::new(2026, 2).unwrap()
    }

    fn service(env: &TestEnvironment) -> MonthReportService<CsvConnection> {
        MonthReportService::new(&env.connection, RetryPolicy::no_retry())
    }

    #[test]
    fn test_submit_creates_report_lazily() {
        let env = TestEnvironment::new().unwrap();
        let ctx = SessionContext::supervisor("sup1", "g1");

        let report = service(&env).submit(&ctx, "g1", "2026-02").unwrap();
        assert_eq!(report.status, ReportStatus::Submitted);
        assert_eq!(report.created_by, "sup1");
    }

    #[test]
    fn test_submit_and_revert_round_trip() {
        let env = TestEnvironment::new().unwrap();
        env.helper().create_draft("g1", &feb()).unwrap();
        let ctx = SessionContext::supervisor("sup1", "g1");
        let svc = service(&env);

        assert_eq!(svc.submit(&ctx, "g1", "2026-02").unwrap().status, ReportStatus::Submitted);
        assert_eq!(svc.submit(&ctx, "g1", "2026-02").unwrap().status, ReportStatus::Submitted);
        assert_eq!(
            svc.revert_to_draft(&ctx, "g1", "2026-02").unwrap().status,
            ReportStatus::Draft
        );
        assert_eq!(
            svc.get_report(&ctx, "g1", "2026-02").unwrap().unwrap().status,
            ReportStatus::Draft
        );
    }

    #[test]
    fn test_status_change_requires_own_group() {
        let env = TestEnvironment::new().unwrap();
        let svc = service(&env);
        assert!(svc
            .submit(&SessionContext::supervisor("sup1", "g1"), "g2", "2026-02")
            .is_err());
        assert!(svc.submit(&SessionContext::admin("root"), "g1", "2026-02").is_err());
        assert!(svc
            .submit(&SessionContext::supervisor("sup1", "g1"), "g1", "2026-14")
            .is_err());
    }

    #[test]
    fn test_delete_month_removes_everything() {
        let env = TestEnvironment::new().unwrap();
        let helper = env.helper();
        helper.create_group("g1", 1, "sup1").unwrap();
        helper.create_group("g2", 2, "sup2").unwrap();
        helper.create_draft("g1", &feb()).unwrap();
        helper.insert_entry("g1", &feb(), MemberMonthEntry::blank("ana", "Ana")).unwrap();
        helper.insert_entry("g1", &feb(), MemberMonthEntry::blank("bia", "Bia")).unwrap();

        let mar = MonthId::new(2026, 3).unwrap();
        helper.create_draft("g1", &mar).unwrap();
        helper.insert_entry("g1", &mar, MemberMonthEntry::blank("ana", "Ana")).unwrap();

        let result = service(&env)
            .delete_month(&SessionContext::admin("root"), "2026-02")
            .unwrap();
        assert!(result.is_complete());
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups[0].entries_removed, 2);
        assert!(result.groups[0].report_removed);
        assert!(!result.groups[1].report_removed);

        assert!(helper.entries("g1", &feb()).unwrap().is_empty());
        let reports = env.connection.create_report_repository();
        assert!(reports.get_report("g1", &feb()).unwrap().is_none());
        assert!(reports.get_report("g1", &mar).unwrap().is_some());
        assert_eq!(helper.entries("g1", &mar).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_entry_keeps_report() {
        let env = TestEnvironment::new().unwrap();
        let helper = env.helper();
        helper.create_group("g1", 1, "sup1").unwrap();
        helper.create_draft("g1", &feb()).unwrap();
        helper.insert_entry("g1", &feb(), MemberMonthEntry::blank("ana", "Ana")).unwrap();
        helper.insert_entry("g1", &feb(), MemberMonthEntry::blank("bia", "Bia")).unwrap();

        let connection = FlakyConnection::new(env.connection.clone());
        connection.fail_writes("bia", u32::MAX);
        let svc = MonthReportService::new(&connection, RetryPolicy::new(2, std::time::Duration::ZERO));

        let result = svc
            .delete_month(&SessionContext::admin("root"), "2026-02")
            .unwrap();
        assert!(!result.is_complete());
        let group = &result.groups[0];
        assert_eq!(group.entries_removed, 1);
        assert_eq!(group.failed_entries, vec!["bia"]);
        assert!(!group.report_removed);

        let reports = env.connection.create_report_repository();
        assert!(reports.get_report("g1", &feb()).unwrap().is_some());

        // Re-running once storage recovers finishes the job.
        connection.fail_writes("bia", 0);
        let retry = svc
            .delete_month(&SessionContext::admin("root"), "2026-02")
            .unwrap();
        assert!(retry.is_complete());
        assert!(retry.groups[0].report_removed);
        assert!(reports.get_report("g1", &feb()).unwrap().is_none());
    }

    #[test]
    fn test_delete_month_is_admin_only() {
        let env = TestEnvironment::new().unwrap();
        let err = service(&env)
            .delete_month(&SessionContext::supervisor("sup1", "g1"), "2026-02")
            .unwrap_err();
        assert_eq!(err.downcast_ref::<AccessError>(), Some(&AccessError::AdminRequired));
    }
}
