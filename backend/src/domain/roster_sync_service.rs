//! # Roster Synchronization
//!
//! Seeds a group's month entries from its persistent roster without ever
//! clobbering entered data.
//!
//! For every active roster member:
//! - no entry for the member in the month: create one with zero/false values
//!   and the roster name;
//! - an entry exists with a different name: write the name field only;
//! - otherwise nothing.
//!
//! Inactive members are skipped and nothing is ever deleted, so past months
//! keep their history. The month report is created as draft when absent and
//! an existing report's status is never rewritten. Running the sync twice
//! with an unchanged roster writes nothing the second time.

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::domain::models::{
    EntryPatch, MemberMonthEntry, MemberRecord, MonthId, MonthIdError, MonthReport,
};
use crate::domain::retry::RetryPolicy;
use crate::domain::session::{AccessError, SessionContext};
use crate::domain::sync_trigger::{roster_fingerprint, SyncTrigger};
use crate::storage::traits::{Connection, EntryStorage, MonthReportStorage, RosterStorage};

/// One write produced by [`plan_month_sync`].
#[derive(Debug, Clone, PartialEq)]
pub enum EntryWrite {
    /// New zero-valued entry for a member with no entry this month.
    Create(MemberMonthEntry),
    /// Name-only update of an existing entry.
    Rename { entry_id: String, name: String },
}

impl EntryWrite {
    pub fn entry_id(&self) -> &str {
        match self {
            EntryWrite::Create(entry) => &entry.id,
            EntryWrite::Rename { entry_id, .. } => entry_id,
        }
    }

    pub fn kind(&self) -> WriteKind {
        match self {
            EntryWrite::Create(_) => WriteKind::Create,
            EntryWrite::Rename { .. } => WriteKind::Rename,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteKind {
    Create,
    Rename,
}

/// Compute the writes that bring a month's entries in line with the roster.
///
/// `existing` maps entry id to the stored display name. A roster listing the
/// same id twice yields one write, for its first occurrence.
pub fn plan_month_sync(roster: &[MemberRecord], existing: &HashMap<String, String>) -> Vec<EntryWrite> {
    let mut seen = HashSet::new();
    let mut writes = Vec::new();

    for member in roster.iter().filter(|m| m.active) {
        if !seen.insert(member.id.as_str()) {
            debug!("Duplicate roster id {} ignored", member.id);
            continue;
        }
        match existing.get(&member.id) {
            None => writes.push(EntryWrite::Create(MemberMonthEntry::blank(&member.id, &member.name))),
            Some(stored) if *stored != member.name => writes.push(EntryWrite::Rename {
                entry_id: member.id.clone(),
                name: member.name.clone(),
            }),
            Some(_) => {}
        }
    }

    writes
}

/// Whole-run outcome of a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Every planned write landed (including the nothing-to-do case).
    Complete,
    /// Some writes landed, the listed members did not.
    Partial,
    /// Writes were planned and none landed.
    Failed,
}

/// A planned write that still failed after retries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedWrite {
    pub member_id: String,
    pub kind: WriteKind,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub group_id: String,
    pub month: MonthId,
    /// Whether this run created the month report document.
    pub report_created: bool,
    pub created: Vec<String>,
    pub renamed: Vec<String>,
    /// Creates that found an entry written concurrently; counted as success.
    pub already_present: Vec<String>,
    pub failed: Vec<FailedWrite>,
}

impl SyncReport {
    fn new(group_id: &str, month: MonthId, report_created: bool) -> Self {
        Self {
            group_id: group_id.to_string(),
            month,
            report_created,
            created: Vec::new(),
            renamed: Vec::new(),
            already_present: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn status(&self) -> SyncStatus {
        let landed = self.created.len() + self.renamed.len() + self.already_present.len();
        if self.failed.is_empty() {
            SyncStatus::Complete
        } else if landed == 0 {
            SyncStatus::Failed
        } else {
            SyncStatus::Partial
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status() == SyncStatus::Complete
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.member_id.as_str()).collect()
    }

    /// Number of entry writes that changed storage.
    pub fn writes_applied(&self) -> usize {
        self.created.len() + self.renamed.len()
    }
}

/// Reasons a sync could not run at all. Nothing is written in these cases,
/// except that `EntriesUnavailable` may follow a report creation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid month: {0}")]
    InvalidMonth(#[from] MonthIdError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("roster of group {group_id} could not be read: {reason}")]
    RosterUnavailable { group_id: String, reason: String },
    #[error("month report {month} of group {group_id} could not be prepared: {reason}")]
    ReportUnavailable {
        group_id: String,
        month: MonthId,
        reason: String,
    },
    #[error("entries of {month} in group {group_id} could not be read: {reason}")]
    EntriesUnavailable {
        group_id: String,
        month: MonthId,
        reason: String,
    },
}

/// Executes roster synchronization against storage.
#[derive(Clone)]
pub struct RosterSyncService<C: Connection> {
    roster: C::RosterRepository,
    reports: C::ReportRepository,
    entries: C::EntryRepository,
    retry: RetryPolicy,
}

impl<C: Connection> RosterSyncService<C> {
    pub fn new(connection: &C, retry: RetryPolicy) -> Self {
        Self {
            roster: connection.create_roster_repository(),
            reports: connection.create_report_repository(),
            entries: connection.create_entry_repository(),
            retry,
        }
    }

    /// Sync the roster selected by `ctx` into `month` (`YYYY-MM`). The month
    /// key is validated before anything is read or written.
    pub fn sync_month(
        &self,
        ctx: &SessionContext,
        requested_group: Option<&str>,
        month: &str,
    ) -> Result<SyncReport, SyncError> {
        let month = MonthId::parse(month)?;
        let group_id = ctx.roster_group(requested_group)?;
        let roster = self.read_roster(&group_id)?;
        self.reconcile(ctx, &group_id, &month, &roster)
    }

    /// Sync only if the group/month pair has not had a complete sync with
    /// the current roster yet. Returns `None` when nothing had to run.
    pub fn sync_if_needed(
        &self,
        ctx: &SessionContext,
        trigger: &SyncTrigger,
        requested_group: Option<&str>,
        month: &str,
    ) -> Result<Option<SyncReport>, SyncError> {
        let month = MonthId::parse(month)?;
        let group_id = ctx.roster_group(requested_group)?;
        trigger.mark_opened(&group_id, &month);

        let roster = self.read_roster(&group_id)?;
        let fingerprint = roster_fingerprint(&roster);
        if !trigger.needs_sync(&group_id, &month, fingerprint) {
            debug!("Roster of {} unchanged since last sync of {}", group_id, month);
            return Ok(None);
        }

        let report = self.reconcile(ctx, &group_id, &month, &roster)?;
        if report.is_complete() {
            trigger.record(&group_id, &month, fingerprint);
        }
        Ok(Some(report))
    }

    fn read_roster(&self, group_id: &str) -> Result<Vec<MemberRecord>, SyncError> {
        self.retry
            .run("read roster", || self.roster.list_members(group_id))
            .map_err(|e| SyncError::RosterUnavailable {
                group_id: group_id.to_string(),
                reason: e.to_string(),
            })
    }

    fn reconcile(
        &self,
        ctx: &SessionContext,
        group_id: &str,
        month: &MonthId,
        roster: &[MemberRecord],
    ) -> Result<SyncReport, SyncError> {
        info!("Syncing roster of group {} into {}", group_id, month);

        let draft = MonthReport::new_draft(*month, &ctx.user_id, Utc::now());
        let report_created = self
            .retry
            .run("create month report", || self.reports.create_report_if_absent(group_id, &draft))
            .map_err(|e| SyncError::ReportUnavailable {
                group_id: group_id.to_string(),
                month: *month,
                reason: e.to_string(),
            })?;

        let existing: HashMap<String, String> = self
            .retry
            .run("read entries", || self.entries.list_entries(group_id, month))
            .map_err(|e| SyncError::EntriesUnavailable {
                group_id: group_id.to_string(),
                month: *month,
                reason: e.to_string(),
            })?
            .into_iter()
            .map(|entry| (entry.id, entry.name))
            .collect();

        let writes = plan_month_sync(roster, &existing);
        let mut report = SyncReport::new(group_id, *month, report_created);

        for write in &writes {
            match self.apply(group_id, month, write) {
                Ok(true) => match write {
                    EntryWrite::Create(_) => report.created.push(write.entry_id().to_string()),
                    EntryWrite::Rename { .. } => report.renamed.push(write.entry_id().to_string()),
                },
                Ok(false) => report.already_present.push(write.entry_id().to_string()),
                Err(e) => {
                    warn!("Sync write for member {} in {}/{} failed: {}", write.entry_id(), group_id, month, e);
                    report.failed.push(FailedWrite {
                        member_id: write.entry_id().to_string(),
                        kind: write.kind(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.writes_applied() > 0 {
            if let Err(e) = self.reports.touch_report(group_id, month, &ctx.user_id, Utc::now()) {
                warn!("Could not update timestamp of report {}/{}: {}", group_id, month, e);
            }
        }

        info!(
            "Sync of {}/{} finished {:?}: {} created, {} renamed, {} failed",
            group_id,
            month,
            report.status(),
            report.created.len(),
            report.renamed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Returns false when a create found the entry already present.
    fn apply(&self, group_id: &str, month: &MonthId, write: &EntryWrite) -> anyhow::Result<bool> {
        match write {
            EntryWrite::Create(entry) => self
                .retry
                .run("create entry", || self.entries.create_entry(group_id, month, entry)),
            EntryWrite::Rename { entry_id, name } => {
                let patch = EntryPatch::rename(name);
                self.retry.run("rename entry", || {
                    self.entries.update_entry_fields(group_id, month, entry_id, &patch)
                })?;
                Ok(true)
            }
        }
    }
}
