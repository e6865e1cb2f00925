//! # Entry Service
//!
//! The edit boundary for month entries. Business rules enforced here rather
//! than in storage:
//!
//! - auxiliary and regular pioneer are mutually exclusive: setting one to
//!   true forces the other false and zeroes the other's hours;
//! - hours and bible studies are never negative;
//! - nothing changes while the month report is submitted;
//! - only the group's own supervisor edits.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::collections::HashSet;

use crate::domain::commands::entries::{
    AddEntryCommand, EntryEdit, ListEntriesResult, RemoveEntryCommand, UpdateEntryCommand,
};
use crate::domain::models::{
    clean_display_name, unique_member_id, EntryPatch, MemberMonthEntry, MonthId, ReportStatus,
};
use crate::domain::session::SessionContext;
use crate::domain::summary_service::summarize;
use crate::storage::traits::{Connection, EntryStorage, MonthReportStorage};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EntryEditError {
    #[error("auxiliary and regular pioneer cannot both be set")]
    BothPioneerFlags,
    #[error("{field} cannot be negative")]
    NegativeValue { field: &'static str },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} is too large")]
    TooLarge { field: &'static str },
    #[error("nothing to update")]
    EmptyEdit,
    #[error("name must be 1 to 100 characters")]
    InvalidName,
    #[error("report {month} of group {group_id} is submitted and read-only")]
    ReportSubmitted { group_id: String, month: MonthId },
    #[error("entry {0} not found")]
    EntryNotFound(String),
    #[error("no free id for '{0}'")]
    NoFreeId(String),
}

impl EntryEdit {
    /// Validate the edit and turn it into a storage patch with the pioneer
    /// exclusivity rule applied. The forced zero of the other hour field
    /// wins over a value for it in the same edit.
    pub fn into_patch(self) -> Result<EntryPatch, EntryEditError> {
        if self.auxiliary_pioneer == Some(true) && self.regular_pioneer == Some(true) {
            return Err(EntryEditError::BothPioneerFlags);
        }

        let mut patch = EntryPatch {
            name: None,
            participated: self.participated,
            auxiliary_pioneer: self.auxiliary_pioneer,
            regular_pioneer: self.regular_pioneer,
            bible_studies: self.bible_studies.map(studies).transpose()?,
            hours_aux: self.hours_aux.map(|h| hours(h, "hoursAux")).transpose()?,
            hours_regular: self
                .hours_regular
                .map(|h| hours(h, "hoursRegular"))
                .transpose()?,
        };

        if patch.auxiliary_pioneer == Some(true) {
            patch.regular_pioneer = Some(false);
            patch.hours_regular = Some(0.0);
        }
        if patch.regular_pioneer == Some(true) {
            patch.auxiliary_pioneer = Some(false);
            patch.hours_aux = Some(0.0);
        }

        if patch.is_empty() {
            return Err(EntryEditError::EmptyEdit);
        }
        Ok(patch)
    }
}

fn hours(value: f64, field: &'static str) -> Result<f64, EntryEditError> {
    if !value.is_finite() {
        Err(EntryEditError::NotFinite { field })
    } else if value < 0.0 {
        Err(EntryEditError::NegativeValue { field })
    } else {
        Ok(value)
    }
}

fn studies(value: i64) -> Result<u32, EntryEditError> {
    if value < 0 {
        return Err(EntryEditError::NegativeValue {
            field: "bibleStudies",
        });
    }
    u32::try_from(value).map_err(|_| EntryEditError::TooLarge {
        field: "bibleStudies",
    })
}

/// Service for reading and editing a group's month entries
#[derive(Clone)]
pub struct EntryService<C: Connection> {
    entries: C::EntryRepository,
    reports: C::ReportRepository,
}

impl<C: Connection> EntryService<C> {
    pub fn new(connection: &C) -> Self {
        Self {
            entries: connection.create_entry_repository(),
            reports: connection.create_report_repository(),
        }
    }

    /// Entries of a month sorted by name, with the report status and summary
    pub fn list_entries(
        &self,
        ctx: &SessionContext,
        group_id: &str,
        month: &str,
    ) -> Result<ListEntriesResult> {
        ctx.require_group_reader(group_id)?;
        let month = MonthId::parse(month)?;

        let mut entries = self.entries.list_entries(group_id, &month)?;
        sort_by_name(&mut entries);
        let status = self.reports.get_report(group_id, &month)?.map(|r| r.status);
        let summary = summarize(&entries);

        Ok(ListEntriesResult {
            group_id: group_id.to_string(),
            month,
            status,
            entries,
            summary,
        })
    }

    pub fn update_entry(&self, ctx: &SessionContext, command: UpdateEntryCommand) -> Result<MemberMonthEntry> {
        ctx.require_group_editor(&command.group_id)?;
        let month = MonthId::parse(&command.month)?;
        let patch = command.edit.into_patch()?;
        self.ensure_editable(&command.group_id, &month)?;

        if self
            .entries
            .get_entry(&command.group_id, &month, &command.entry_id)?
            .is_none()
        {
            return Err(EntryEditError::EntryNotFound(command.entry_id).into());
        }

        let updated = self
            .entries
            .update_entry_fields(&command.group_id, &month, &command.entry_id, &patch)?;
        info!(
            "Updated entry {} in {}/{} by {}",
            updated.id, command.group_id, month, ctx.user_id
        );
        self.touch(ctx, &command.group_id, &month);
        Ok(updated)
    }

    /// Add a row for someone who is not on the roster. The id is derived
    /// from the name and made unique within the month.
    pub fn add_entry(&self, ctx: &SessionContext, command: AddEntryCommand) -> Result<MemberMonthEntry> {
        ctx.require_group_editor(&command.group_id)?;
        let month = MonthId::parse(&command.month)?;
        let name = clean_display_name(&command.name).ok_or(EntryEditError::InvalidName)?;
        self.ensure_editable(&command.group_id, &month)?;

        let taken: HashSet<String> = self
            .entries
            .list_entries(&command.group_id, &month)?
            .into_iter()
            .map(|e| e.id)
            .collect();
        let id = unique_member_id(&name, |candidate| taken.contains(candidate))
            .ok_or_else(|| EntryEditError::NoFreeId(name.clone()))?;

        let entry = MemberMonthEntry::blank(&id, &name);
        if !self.entries.create_entry(&command.group_id, &month, &entry)? {
            // Another writer took the id between the read and the write.
            return Err(EntryEditError::NoFreeId(name).into());
        }
        info!("Added entry {} to {}/{}", id, command.group_id, month);
        self.touch(ctx, &command.group_id, &month);
        Ok(entry)
    }

    pub fn remove_entry(&self, ctx: &SessionContext, command: RemoveEntryCommand) -> Result<()> {
        ctx.require_group_editor(&command.group_id)?;
        let month = MonthId::parse(&command.month)?;
        self.ensure_editable(&command.group_id, &month)?;

        if !self
            .entries
            .delete_entry(&command.group_id, &month, &command.entry_id)?
        {
            return Err(EntryEditError::EntryNotFound(command.entry_id).into());
        }
        info!("Removed entry {} from {}/{}", command.entry_id, command.group_id, month);
        self.touch(ctx, &command.group_id, &month);
        Ok(())
    }

    fn ensure_editable(&self, group_id: &str, month: &MonthId) -> Result<()> {
        match self.reports.get_report(group_id, month)? {
            Some(report) if report.status == ReportStatus::Submitted => {
                Err(EntryEditError::ReportSubmitted {
                    group_id: group_id.to_string(),
                    month: *month,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn touch(&self, ctx: &SessionContext, group_id: &str, month: &MonthId) {
        if let Err(e) = self
            .reports
            .touch_report(group_id, month, &ctx.user_id, Utc::now())
        {
            warn!("Could not update timestamp of report {}/{}: {}", group_id, month, e);
        }
    }
}

/// Case-insensitive name order, id as tie-break.
pub fn sort_by_name(entries: &mut [MemberMonthEntry]) {
    entries.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}
