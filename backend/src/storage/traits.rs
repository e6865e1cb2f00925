//! # Storage Traits
//!
//! This module defines the document-persistence contract the domain layer is
//! written against: read-one, read-collection, create, field-level update and
//! delete per collection, plus change notification through the connection.
//! Any backend that implements these traits can be swapped in without
//! touching the domain services.

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::notify::ChangeNotifier;
use crate::domain::models::{
    EntryPatch, Group, MemberMonthEntry, MemberRecord, MonthId, MonthReport, ReportStatus,
    UserProfile,
};

/// Groups of the congregation.
pub trait GroupStorage: Send + Sync {
    /// Create or replace a group document
    fn store_group(&self, group: &Group) -> Result<()>;

    fn get_group(&self, group_id: &str) -> Result<Option<Group>>;

    /// List all groups ordered by group number
    fn list_groups(&self) -> Result<Vec<Group>>;
}

/// The persistent roster of a group.
pub trait RosterStorage: Send + Sync {
    /// List every member of a group, active or not
    fn list_members(&self, group_id: &str) -> Result<Vec<MemberRecord>>;

    fn get_member(&self, group_id: &str, member_id: &str) -> Result<Option<MemberRecord>>;

    /// Create a member. Fails if the id is already taken in the group.
    fn create_member(&self, group_id: &str, member: &MemberRecord) -> Result<()>;

    /// Replace an existing member. Fails if the member does not exist.
    fn update_member(&self, group_id: &str, member: &MemberRecord) -> Result<()>;

    /// Returns true if the member was found and deleted
    fn delete_member(&self, group_id: &str, member_id: &str) -> Result<bool>;
}

/// Month report documents, one per group per month.
pub trait MonthReportStorage: Send + Sync {
    fn get_report(&self, group_id: &str, month: &MonthId) -> Result<Option<MonthReport>>;

    /// Create the report unless one already exists; an existing report is
    /// left untouched. Returns true when a new document was written.
    fn create_report_if_absent(&self, group_id: &str, report: &MonthReport) -> Result<bool>;

    /// Set the status field and the last-update stamp of an existing report
    fn update_status(
        &self,
        group_id: &str,
        month: &MonthId,
        status: ReportStatus,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Refresh only the last-update stamp. A missing report is ignored.
    fn touch_report(
        &self,
        group_id: &str,
        month: &MonthId,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Returns true if the report document existed and was deleted
    fn delete_report(&self, group_id: &str, month: &MonthId) -> Result<bool>;
}

/// Member entries inside a month report.
pub trait EntryStorage: Send + Sync {
    fn list_entries(&self, group_id: &str, month: &MonthId) -> Result<Vec<MemberMonthEntry>>;

    fn get_entry(
        &self,
        group_id: &str,
        month: &MonthId,
        entry_id: &str,
    ) -> Result<Option<MemberMonthEntry>>;

    /// Create an entry unless one with the same id exists; an existing entry
    /// is never overwritten. Returns true when the entry was written.
    fn create_entry(&self, group_id: &str, month: &MonthId, entry: &MemberMonthEntry)
        -> Result<bool>;

    /// Write only the fields set in `patch` and return the resulting entry.
    /// Fails if the entry does not exist.
    fn update_entry_fields(
        &self,
        group_id: &str,
        month: &MonthId,
        entry_id: &str,
        patch: &EntryPatch,
    ) -> Result<MemberMonthEntry>;

    /// Returns true if the entry was found and deleted
    fn delete_entry(&self, group_id: &str, month: &MonthId, entry_id: &str) -> Result<bool>;
}

/// Profiles of authenticated users.
pub trait UserStorage: Send + Sync {
    fn get_profile(&self, uid: &str) -> Result<Option<UserProfile>>;

    fn list_profiles(&self) -> Result<Vec<UserProfile>>;

    /// Create or replace a profile
    fn store_profile(&self, profile: &UserProfile) -> Result<()>;
}

/// Trait defining the interface for storage connections
///
/// A connection is a factory for repositories over one data set and owns the
/// change notifier those repositories publish to. This allows the domain
/// layer to work with any storage backend without knowing the implementation
/// details.
pub trait Connection: Send + Sync + Clone + 'static {
    type GroupRepository: GroupStorage + Clone;
    type RosterRepository: RosterStorage + Clone;
    type ReportRepository: MonthReportStorage + Clone;
    type EntryRepository: EntryStorage + Clone;
    type UserRepository: UserStorage + Clone;

    fn create_group_repository(&self) -> Self::GroupRepository;
    fn create_roster_repository(&self) -> Self::RosterRepository;
    fn create_report_repository(&self) -> Self::ReportRepository;
    fn create_entry_repository(&self) -> Self::EntryRepository;
    fn create_user_repository(&self) -> Self::UserRepository;

    fn notifier(&self) -> &ChangeNotifier;
}
